//! KTP and signature processing engine
//!
//! This module contains the core document logic:
//! - Word box geometry and fuzzy matching helpers
//! - KTP field extraction from OCR annotations
//! - Signature isolation from photos

mod text;
mod ktp;
mod normalize;
mod signature;

pub use ktp::KtpExtractor;
pub use signature::SignatureService;

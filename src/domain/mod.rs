//! Domain types and models

mod annotation;
mod ktp;
mod signature;

pub use annotation::{OcrResult, TextAnnotation, Vertex};
pub use ktp::{KtpData, KtpResponse};
pub use signature::{SignatureBox, SignatureDimensions, SignatureResponse};

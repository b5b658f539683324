//! PaddleOCR Provider Module
//!
//! Fallback text detection through a PaddleHub `ocr_system` serving endpoint.
//! Results are mapped into the Google Vision annotation layout.

mod client;
mod mapper;
mod models;

pub use client::PaddleOcrProvider;

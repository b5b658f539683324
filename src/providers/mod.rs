//! OCR Provider Integration Module
//!
//! Text detection backends behind a common trait, plus the rate-limited HTTP
//! client shared by every outbound integration.
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────────┐
//!                 │   SmartOcr   │
//!                 └──────┬───────┘
//!                        │ fallback order
//!            ┌───────────┴───────────┐
//!            │                       │
//!   ┌────────┴────────┐     ┌────────┴───────┐
//!   │  Google Vision  │     │   PaddleOCR    │
//!   └─────────────────┘     └────────────────┘
//! ```

pub mod traits;
pub mod http_client;
pub mod google_vision;
pub mod paddle;
pub mod smart;

// Re-export commonly used types
pub use traits::{OcrProvider, ProviderError, ProviderResult};
pub use http_client::{ClientError, RateLimitedClient};
pub use smart::{OcrStatus, ServiceStatus, SmartOcr};

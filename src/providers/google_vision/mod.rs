//! Google Cloud Vision Provider Module
//!
//! Text detection through the Vision REST API, authenticated either with an
//! API key or with a service-account credentials file.

mod auth;
mod client;
mod models;

pub use client::GoogleVisionProvider;

//! HTTP request handlers

pub mod health;
pub mod info;
pub mod ktp;
pub mod signature;

//! HTTP transport built on reqwest

pub mod client;

pub use client::{HttpClient, HttpClientBuilder, DEFAULT_USER_AGENT};

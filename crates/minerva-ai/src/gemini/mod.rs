//! Google Gemini API client.
//!
//! Implements the `GenerativeBackend` trait against the Generative
//! Language API's generateContent endpoint.

mod api;
mod client;
mod config;

pub use client::GeminiClient;
pub use config::GeminiConfig;

//! Gemini integration
//!
//! Natural-language parameter extraction for playlist requests.
//!
//! API docs: https://ai.google.dev/api/generate-content

pub mod dto;
mod adapter;
mod client;

pub use client::{DEFAULT_MODEL, GeminiClient};

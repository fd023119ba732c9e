//! External services - the music service the playlist is built on and the
//! model that reads the user's request.
//!
//! # Architecture
//!
//! This module follows a clean separation between:
//! - **Domain models** (`crate::model`, `domain.rs`) - Internal types and the shared error taxonomy
//! - **API DTOs** (`spotify/dto.rs`, `gemini/dto.rs`) - Exact API request/response shapes
//! - **Adapters** - Convert DTOs to domain models
//! - **Clients** - HTTP clients for external APIs
//! - **Traits** (`traits.rs`) - Seams the generator depends on, with test mocks
//!
//! The generator only ever sees [`MusicService`] and [`ExtractionService`],
//! so tests run the whole pipeline against in-memory mocks.

pub mod domain;
pub mod gemini;
pub mod spotify;
pub mod traits;

pub use domain::{ExtractedParams, ServiceError};
pub use traits::{ExtractionService, MusicService, TokenProvider};

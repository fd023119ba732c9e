//! Natural-language request parsing.
//!
//! Turns the user's free text into a [`GenerationRequest`]. Parsing never
//! fails: if the extraction service is missing or its answer is unusable,
//! the whole text becomes the guidelines and every other field keeps its
//! default.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::model::{DEFAULT_NUM_SONGS, GenerationRequest};
use crate::services::{ExtractedParams, ExtractionService};

/// Parses free text into a [`GenerationRequest`].
pub struct IntentParser {
    extraction: Option<Arc<dyn ExtractionService>>,
    max_songs: u32,
}

impl IntentParser {
    /// `extraction` is `None` when no model is configured.
    pub fn new(extraction: Option<Arc<dyn ExtractionService>>, max_songs: u32) -> Self {
        Self {
            extraction,
            max_songs: max_songs.max(1),
        }
    }

    /// Parse `text`. `known_rulesets` are the names the model may choose from.
    pub async fn parse(&self, text: &str, known_rulesets: &[String]) -> GenerationRequest {
        let Some(extraction) = &self.extraction else {
            debug!("No extraction service configured, using text as guidelines");
            return GenerationRequest::from_guidelines(text.trim());
        };

        match extraction.extract(text, known_rulesets).await {
            Ok(params) => {
                debug!(?params, "Extracted request parameters");
                self.to_request(params)
            }
            Err(e) => {
                warn!(error = %e, "Parameter extraction failed, using text as guidelines");
                GenerationRequest::from_guidelines(text.trim())
            }
        }
    }

    fn to_request(&self, params: ExtractedParams) -> GenerationRequest {
        let num_songs = match params.num_songs {
            Some(n) if n > 0 => n.min(i64::from(self.max_songs)) as u32,
            _ => DEFAULT_NUM_SONGS,
        };

        GenerationRequest::new(
            num_songs,
            params.is_daily_drive.unwrap_or(false),
            params.allow_explicit.unwrap_or(true),
            params.ruleset_name,
            params.guidelines.unwrap_or_default().trim(),
            params.music_only.unwrap_or(false),
        )
    }
}

/// Command-line values that take precedence over extracted ones.
#[derive(Debug, Clone, Default)]
pub struct RequestOverrides {
    pub num_songs: Option<u32>,
    pub daily_drive: bool,
    pub no_explicit: bool,
    pub ruleset: Option<String>,
}

impl RequestOverrides {
    /// Overlay onto `request`. An explicit count is clamped to `1..=max_songs`.
    pub fn apply(&self, request: GenerationRequest, max_songs: u32) -> GenerationRequest {
        let num_songs = match self.num_songs {
            Some(n) => n.clamp(1, max_songs.max(1)),
            None => request.num_songs(),
        };

        GenerationRequest::new(
            num_songs,
            self.daily_drive || request.is_daily_drive(),
            !self.no_explicit && request.allow_explicit(),
            self.ruleset
                .clone()
                .or_else(|| request.ruleset_name().map(String::from)),
            request.guidelines(),
            request.music_only(),
        )
    }
}

//! Playlist generation command.

use std::sync::Arc;

use tokio::runtime::Runtime;
use tracing::info;

use super::Context;
use crate::auth;
use crate::error::ResultExt;
use crate::generator::{
    AssembledPlaylist, GeneratorSettings, IntentParser, PlaylistGenerator, RequestOverrides,
};
use crate::model::{GenerationRequest, PlaylistResult};
use crate::rulesets;
use crate::services::ExtractionService;
use crate::services::gemini::GeminiClient;

/// Parse a description and generate a playlist
pub fn cmd_generate(
    rt: &Runtime,
    ctx: &Context,
    prompt: &str,
    overrides: RequestOverrides,
    dry_run: bool,
    user_id: Option<i64>,
    json: bool,
) -> anyhow::Result<()> {
    rt.block_on(async {
        let pool = ctx.pool().await?;
        let config = &ctx.config;

        let known: Vec<String> = rulesets::list_rulesets(&pool, true)
            .await?
            .into_iter()
            .map(|r| r.name)
            .collect();

        let extraction: Option<Arc<dyn ExtractionService>> =
            match config.credentials.gemini_api_key.as_deref() {
                Some(key) if !key.trim().is_empty() => Some(Arc::new(GeminiClient::new(
                    key,
                    &config.credentials.gemini_model,
                    config.http.timeout(),
                )?)),
                _ => {
                    info!("GEMINI_API_KEY not set, the description is used as-is");
                    None
                }
            };

        let parser = IntentParser::new(extraction, config.generation.max_songs);
        let request = overrides.apply(
            parser.parse(prompt, &known).await,
            config.generation.max_songs,
        );

        let user = auth::load_user(&pool, user_id)
            .await
            .with_context("loading stored login")?;
        let spotify = ctx.spotify(&pool, &user)?;
        let generator = PlaylistGenerator::new(
            Arc::new(spotify),
            pool.clone(),
            GeneratorSettings::from_config(config),
        );

        if dry_run {
            let playlist = generator
                .preview(&request)
                .await
                .with_context("previewing playlist")?;
            print_preview(&request, &playlist);
            return Ok(());
        }

        let result = generator
            .generate_playlist(&user.context(), &request)
            .await
            .with_context("generating playlist")?;
        if json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            print_result(&result, request.num_songs());
        }
        anyhow::Ok(())
    })
}

fn print_request(request: &GenerationRequest) {
    println!("Request");
    println!("  Songs:        {}", request.num_songs());
    println!("  Daily drive:  {}", request.is_daily_drive());
    println!("  Explicit:     {}", if request.allow_explicit() { "allowed" } else { "avoided" });
    if let Some(name) = request.ruleset_name() {
        println!("  Ruleset:      {}", name);
    }
    if !request.guidelines().is_empty() {
        println!("  Guidelines:   {}", request.guidelines());
    }
}

fn print_preview(request: &GenerationRequest, playlist: &AssembledPlaylist) {
    print_request(request);
    println!();
    println!("{} (not created)", playlist.name);
    if !playlist.rulesets_applied.is_empty() {
        println!("Rulesets: {}", playlist.rulesets_applied.join(", "));
    }
    if let Some(intro) = &playlist.intro_track {
        println!("   intro  spotify:track:{}", intro);
    }
    for (i, selected) in playlist.tracks.iter().enumerate() {
        let track = &selected.track;
        let year = track
            .release_year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "????".to_string());
        let explicit = if track.is_explicit { " [E]" } else { "" };
        println!("  {:>3}.  {} ({}){}", i + 1, track.name, year, explicit);
    }
    println!();
    println!("{} of {} tracks", playlist.tracks_count(), request.num_songs());
}

fn print_result(result: &PlaylistResult, requested: u32) {
    println!("Created \"{}\"", result.name);
    println!("  {}", result.spotify_url);
    println!("  {} of {} tracks", result.tracks_count, requested);
    if !result.rulesets_applied.is_empty() {
        println!("  Rulesets: {}", result.rulesets_applied.join(", "));
    }
}

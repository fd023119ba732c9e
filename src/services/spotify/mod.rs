//! Spotify Web API integration
//!
//! Supplies followed artists and their top tracks as pipeline candidates,
//! and publishes the finished playlist.
//!
//! API docs: https://developer.spotify.com/documentation/web-api

pub mod dto;
mod adapter;
mod client;

pub use client::{AccountsClient, MAX_FOLLOWED_PAGE, SCOPES, SpotifyClient};

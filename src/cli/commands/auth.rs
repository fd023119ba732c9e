//! Spotify authorization commands.

use chrono::Utc;
use tokio::runtime::Runtime;

use super::Context;
use crate::auth::{self, AuthError};
use crate::services::spotify::SCOPES;

/// Print the authorization URL
pub fn cmd_auth_url(ctx: &Context) -> anyhow::Result<()> {
    let accounts = ctx.accounts()?;
    let redirect_uri = &ctx.config.credentials.spotify_redirect_uri;

    println!("Open this URL and approve access:");
    println!();
    println!("  {}", accounts.authorize_url(redirect_uri));
    println!();
    println!("You will be redirected to {}?code=...", redirect_uri);
    println!("Then run: playlist-agent auth login <code>");
    Ok(())
}

/// Exchange an authorization code and store the user
pub fn cmd_auth_login(rt: &Runtime, ctx: &Context, code: &str) -> anyhow::Result<()> {
    let accounts = ctx.accounts()?;
    rt.block_on(async {
        let pool = ctx.pool().await?;
        let user = auth::login(
            &pool,
            &accounts,
            code,
            &ctx.config.credentials.spotify_redirect_uri,
            ctx.config.http.timeout(),
        )
        .await?;

        println!(
            "Logged in as {} (user id {})",
            user.context().label(),
            user.id
        );
        anyhow::Ok(())
    })
}

/// Show the stored login
pub fn cmd_auth_status(rt: &Runtime, ctx: &Context) -> anyhow::Result<()> {
    rt.block_on(async {
        let pool = ctx.pool().await?;
        let user = match auth::load_user(&pool, None).await {
            Ok(user) => user,
            Err(AuthError::NotLoggedIn) => {
                println!("Not logged in. Run `playlist-agent auth url` to start.");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        println!("User:     {} (id {})", user.context().label(), user.id);
        println!("Spotify:  {}", user.spotify_user_id);
        if let Some(email) = &user.email {
            println!("Email:    {}", email);
        }
        let now = Utc::now();
        if user.is_expired(now) {
            println!("Token:    expired (refreshed automatically on next use)");
        } else {
            let minutes = (user.token_expires_at - now).num_minutes();
            println!("Token:    valid for {} more minutes", minutes);
        }
        println!("Scopes:   {}", SCOPES.join(" "));
        anyhow::Ok(())
    })
}

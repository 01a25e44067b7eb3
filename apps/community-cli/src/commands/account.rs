//! Account commands.

use community_core::ports::OAuthProvider;

use crate::error::{CliError, CliResult};
use crate::state::AppState;

/// community-cli login <email> --password <password>
pub async fn login(state: &AppState, email: &str, password: &str) -> CliResult<()> {
    let user = state.login().sign_in(email, password).await?;
    println!("Signed in as {} <{}>", user.display_name(), user.email);
    Ok(())
}

/// community-cli oauth <provider>
pub async fn oauth(
    state: &AppState,
    provider: OAuthProvider,
    redirect: Option<&str>,
) -> CliResult<()> {
    let redirect = redirect.unwrap_or(&state.config.oauth_redirect);
    let target = state.login().sign_in_with_oauth(provider, redirect).await?;
    println!("Open this URL to sign in with {}:", target.provider);
    println!("{}", target.url);
    Ok(())
}

/// community-cli logout
pub async fn logout(state: &AppState) -> CliResult<()> {
    if !state.session.is_signed_in() {
        println!("Not signed in.");
        return Ok(());
    }
    state.profile().sign_out().await;
    println!("Signed out.");
    Ok(())
}

/// community-cli whoami - checks the stored session with the backend first.
pub async fn whoami(state: &AppState) -> CliResult<()> {
    let user = state
        .login()
        .restore()
        .await
        .ok_or_else(|| CliError::Unauthorized("Not signed in".to_string()))?;

    println!("{}", user.display_name());
    println!("  id:     {}", user.id);
    println!("  email:  {}", user.email);
    if let Some(created_at) = user.created_at {
        println!("  joined: {}", created_at.format("%Y-%m-%d"));
    }
    Ok(())
}

/// community-cli nickname <name>
pub async fn nickname(state: &AppState, name: &str) -> CliResult<()> {
    let user = state.profile().update_nickname(name).await?;
    println!("Nickname set to {}", user.display_name());
    Ok(())
}

//! Command handlers and dispatch.

mod account;
mod posts;

use crate::cli::Command;
use crate::error::CliResult;
use crate::state::AppState;

/// Run one command against the application state.
pub async fn run(command: Command, state: &AppState) -> CliResult<()> {
    match command {
        Command::Login { email, password } => account::login(state, &email, &password).await,
        Command::Oauth { provider, redirect } => {
            account::oauth(state, provider, redirect.as_deref()).await
        }
        Command::Logout => account::logout(state).await,
        Command::Whoami => account::whoami(state).await,
        Command::Nickname { name } => account::nickname(state, &name).await,
        Command::Posts { page } => posts::list(state, page).await,
        Command::Browse => posts::browse(state).await,
        Command::Show { id } => posts::show(state, id).await,
        Command::Comment { id, text } => posts::comment(state, id, &text).await,
    }
}

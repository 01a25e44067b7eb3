//! Command-line interface definition.

use clap::{Parser, Subcommand};
use community_core::ports::OAuthProvider;

/// Terminal client for the Fast Community bulletin board.
#[derive(Debug, Parser)]
#[command(name = "community-cli", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in with email and password
    Login {
        email: String,
        #[arg(long, env = "COMMUNITY_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Print the sign-in URL of an identity provider
    Oauth {
        /// google, github or kakao
        provider: OAuthProvider,
        /// Where the provider sends the user back to
        #[arg(long)]
        redirect: Option<String>,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// List one page of posts, newest first
    Posts {
        #[arg(long, short, default_value_t = 1)]
        page: u32,
    },

    /// Page through posts interactively
    Browse,

    /// Show a post and its comments
    Show { id: i64 },

    /// Comment on a post
    Comment { id: i64, text: String },

    /// Change the nickname of the signed-in user
    Nickname { name: String },
}

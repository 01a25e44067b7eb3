//! Post commands.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};

use community_core::detail::DetailSnapshot;
use community_core::domain::PostSummary;
use community_core::listing::{
    ListingSnapshot, LoadOutcome, LoadStatus, PageNavigator, PageSync, PostListing,
};

use crate::error::{CliError, CliResult};
use crate::state::AppState;

const SETTLE_POLL: Duration = Duration::from_millis(10);

fn failed(status: &LoadStatus) -> CliError {
    match status {
        LoadStatus::Failed(message) => CliError::Remote(message.clone()),
        _ => CliError::Internal("load did not finish".to_string()),
    }
}

fn post_line(post: &PostSummary) -> String {
    format!(
        "#{:<5} {}  ({}, {})",
        post.id,
        post.display_title(),
        post.author.as_deref().unwrap_or("anonymous"),
        post.created_at.format("%Y-%m-%d"),
    )
}

fn print_page(snapshot: &ListingSnapshot) {
    if snapshot.is_empty() {
        println!("No posts yet.");
        return;
    }

    let pagination = &snapshot.pagination;
    println!("Page {}/{}", pagination.current_page, pagination.total_pages);
    for post in &snapshot.posts {
        println!("{}", post_line(post));
    }
}

/// community-cli posts --page <n>
///
/// The page count is only known after a first fetch, so other pages are
/// reached through page 1.
pub async fn list(state: &AppState, page: u32) -> CliResult<()> {
    let listing = state.listing();

    if listing.load_page(1).await? == LoadOutcome::Failed {
        return Err(failed(&listing.snapshot().status));
    }
    if page != 1 && listing.load_page(page).await? == LoadOutcome::Failed {
        return Err(failed(&listing.snapshot().status));
    }

    print_page(&listing.snapshot());
    Ok(())
}

/// Wait until the page last requested through `navigator` has settled.
async fn settled(listing: &PostListing, navigator: &PageNavigator) -> ListingSnapshot {
    loop {
        let snapshot = listing.snapshot();
        let done = matches!(snapshot.status, LoadStatus::Loaded | LoadStatus::Failed(_));
        if done && snapshot.pagination.current_page == navigator.requested_page() {
            return snapshot;
        }
        tokio::time::sleep(SETTLE_POLL).await;
    }
}

/// community-cli browse
pub async fn browse(state: &AppState) -> CliResult<()> {
    let listing = Arc::new(state.listing());
    let (navigator, sync) = PageSync::new(listing.clone());
    let task = sync.spawn();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let snapshot = settled(&listing, &navigator).await;
        match snapshot.error() {
            Some(message) => println!("Could not load posts: {message}"),
            None => print_page(&snapshot),
        }
        println!("[n]ext, [p]revious, [r]eload, a page number, or [q]uit");

        let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| CliError::Internal(e.to_string()))?
        else {
            break;
        };

        let pagination = snapshot.pagination;
        let target = match line.trim() {
            "q" => break,
            "" | "r" => {
                listing.reload().await?;
                continue;
            }
            "n" => pagination.current_page.saturating_add(1),
            "p" => pagination.current_page.saturating_sub(1),
            other => match other.parse::<u32>() {
                Ok(page) => page,
                Err(_) => {
                    println!("Unknown input {other:?}");
                    continue;
                }
            },
        };

        if !pagination.accepts(target) {
            println!("There is no page {target}.");
            continue;
        }
        navigator.go_to(target);
    }

    drop(navigator);
    task.await.map_err(|e| CliError::Internal(e.to_string()))
}

fn print_detail(snapshot: &DetailSnapshot) {
    let Some(post) = &snapshot.post else {
        return;
    };

    println!("{}", post_line(post));
    println!();
    println!("{}", post.content);
    println!();

    if snapshot.comments.is_empty() {
        println!("No comments yet.");
    } else {
        println!("{} comment(s):", snapshot.comments.len());
        for comment in &snapshot.comments {
            println!(
                "  [{}] {}",
                comment.created_at.format("%Y-%m-%d %H:%M"),
                comment.content
            );
        }
    }

    if let Some(message) = &snapshot.comment_error {
        println!("(comments may be incomplete: {message})");
    }
}

/// community-cli show <id>
pub async fn show(state: &AppState, id: i64) -> CliResult<()> {
    let detail = state.detail();
    if detail.load(id).await == LoadOutcome::Failed {
        return Err(failed(&detail.snapshot().status));
    }

    print_detail(&detail.snapshot());
    Ok(())
}

/// community-cli comment <id> <text>
pub async fn comment(state: &AppState, id: i64, text: &str) -> CliResult<()> {
    let detail = state.detail();
    if detail.load(id).await == LoadOutcome::Failed {
        return Err(failed(&detail.snapshot().status));
    }

    detail.submit_comment(text).await?;
    print_detail(&detail.snapshot());
    Ok(())
}

use chrono::Utc;

use crate::app::{AppContext, NewsError, Result};
use crate::cli::ListingArgs;
use crate::domain::{Article, SessionAction};
use crate::pipeline::timestamp::{format_display_date, time_ago};
use crate::pipeline::{Completion, FeedSession};

pub async fn headlines(ctx: &AppContext, args: &ListingArgs) -> Result<()> {
    let mut session = new_session(ctx, args)?;
    load_pages(ctx, &mut session, args.pages.max(1)).await?;
    print_articles(session.articles());
    Ok(())
}

/// Runs the query through the debounced search controller, then pages on
/// through the session.
pub async fn search(ctx: &AppContext, query: &str, args: &ListingArgs) -> Result<()> {
    if query.trim().is_empty() {
        return Err(NewsError::Other("Search query is empty".into()));
    }

    let (handle, mut outcomes) = ctx.spawn_search();
    handle.configure(args.filter(), args.order());
    handle.input(query);
    let outcome = loop {
        match outcomes.recv().await {
            Some(outcome) if handle.is_current(&outcome) => break outcome,
            Some(_) => continue,
            None => return Err(NewsError::Other("Search stopped unexpectedly".into())),
        }
    };

    let mut session = new_session(ctx, args)?;
    if let Completion::Failed(failure) = session.accept_search(outcome) {
        tracing::error!("Search failed: {}", failure);
        return Err(NewsError::Other(failure.user_message().to_string()));
    }
    load_pages(ctx, &mut session, args.pages.max(1) - 1).await?;

    if session.articles().is_empty() {
        println!("No results for \"{}\"", query.trim());
        return Ok(());
    }
    print_articles(session.articles());
    Ok(())
}

fn new_session(ctx: &AppContext, args: &ListingArgs) -> Result<FeedSession> {
    let mut session = FeedSession::new();
    session.dispatch(SessionAction::ApplyFilters(args.filter()));
    if args.oldest {
        session.dispatch(SessionAction::SetSort(args.order()));
    }
    session.set_bookmarked_urls(ctx.bookmarks.bookmarked_urls()?);
    Ok(session)
}

async fn load_pages(ctx: &AppContext, session: &mut FeedSession, pages: u32) -> Result<()> {
    for _ in 0..pages {
        match session.load_next(&ctx.paginator).await {
            Completion::Failed(failure) => {
                tracing::error!("Load failed: {}", failure);
                if session.articles().is_empty() {
                    return Err(NewsError::Other(failure.user_message().to_string()));
                }
                eprintln!("{}", failure.user_message());
                break;
            }
            Completion::Applied { appended } => {
                tracing::debug!("Appended {} articles", appended);
            }
            Completion::Exhausted => break,
            Completion::Stale | Completion::Buffered => {}
        }
    }
    Ok(())
}

pub async fn list_bookmarks(ctx: &AppContext) -> Result<()> {
    let bookmarks = ctx.bookmarks.list_all().current();
    if bookmarks.is_empty() {
        println!("No bookmarks");
        return Ok(());
    }

    for bookmark in &bookmarks {
        let article = bookmark.to_article();
        println!("* {}", article.display_title());
        println!(
            "    {} | {}",
            article.source_name(),
            format_display_date(article.published_at.as_deref())
        );
        if let Some(content) = article.full_content() {
            println!("    {}", content);
        }
        println!("    {}", article.url);
    }
    Ok(())
}

pub async fn add_bookmark(ctx: &AppContext, url: &str, title: Option<String>) -> Result<()> {
    if ctx.bookmarks.is_bookmarked(url)? {
        println!("Already bookmarked: {}", url);
        return Ok(());
    }

    let mut article = Article::new(url.trim());
    article.title = title;
    ctx.bookmarks.add(&article).await?;
    println!("Bookmarked: {}", url);
    Ok(())
}

pub async fn remove_bookmark(ctx: &AppContext, url: &str) -> Result<()> {
    if !ctx.bookmarks.remove(url).await? {
        return Err(NewsError::BookmarkNotFound(url.to_string()));
    }
    println!("Removed bookmark: {}", url);
    Ok(())
}

fn print_articles(articles: &[Article]) {
    let now = Utc::now();
    for article in articles {
        let marker = if article.bookmarked { "*" } else { " " };
        println!("{} {}", marker, article.display_title());
        println!(
            "    {} | {}",
            article.source_name(),
            time_ago(article.published_at.as_deref(), now)
        );
        println!("    {}", article.url);
    }
}

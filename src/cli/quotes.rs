//! Quote display and editing commands.

use super::CliContext;
use crate::Result;
use crate::models::CategoryFilter;

/// Shows a random quote from the visible set.
///
/// # Errors
///
/// Returns an error if the book lock is poisoned.
pub fn cmd_show(ctx: &CliContext) -> Result<()> {
    match ctx.lock()?.show_random() {
        Some(quote) => println!("{quote}"),
        None => println!("No quotes available for this category."),
    }
    Ok(())
}

/// Shows the last quote viewed in this session.
///
/// # Errors
///
/// Returns an error if the book lock is poisoned.
pub fn cmd_last(ctx: &CliContext) -> Result<()> {
    match ctx.lock()?.last_viewed() {
        Some(quote) => println!("{quote}"),
        None => println!("No quote viewed in this session."),
    }
    Ok(())
}

/// Adds a quote, then posts it to the remote unless disabled.
///
/// A failed post is reported but does not fail the command.
///
/// # Errors
///
/// Returns an error if the quote is invalid or cannot be saved.
pub async fn cmd_add(ctx: &CliContext, text: &str, category: &str, no_post: bool) -> Result<()> {
    let quote = ctx.lock()?.add(text, category)?;
    println!("Added quote {} to {}", quote.id, quote.category);

    if no_post || !ctx.config().sync.post_new_quotes {
        return Ok(());
    }

    let agent = ctx.agent()?;
    if let Err(e) = agent.post_quote(&quote).await {
        eprintln!("Warning: quote saved locally but not posted: {e}");
    }
    Ok(())
}

/// Lists the quotes passing the current filter.
///
/// # Errors
///
/// Returns an error if the book lock is poisoned.
pub fn cmd_list(ctx: &CliContext) -> Result<()> {
    let book = ctx.lock()?;
    let visible = book.visible();

    println!("Filter: {} ({} quote(s))", book.filter(), visible.len());
    for (index, quote) in visible.iter().enumerate() {
        println!("{:>3}. \"{}\" [{}]", index + 1, quote.text, quote.category);
    }
    Ok(())
}

/// Lists the categories, marking the active one.
///
/// # Errors
///
/// Returns an error if the book lock is poisoned.
pub fn cmd_categories(ctx: &CliContext) -> Result<()> {
    let book = ctx.lock()?;
    let active = book.filter();

    let marker = |selected: bool| if selected { "*" } else { " " };
    println!("{} {}", marker(*active == CategoryFilter::All), CategoryFilter::ALL);
    for category in book.categories() {
        let selected = matches!(active, CategoryFilter::Only(name) if *name == category);
        println!("{} {category}", marker(selected));
    }
    Ok(())
}

/// Sets the category filter.
///
/// # Errors
///
/// Returns an error for a blank name or if the filter cannot be saved.
pub fn cmd_filter(ctx: &CliContext, name: &str) -> Result<()> {
    let mut book = ctx.lock()?;
    book.set_category(name)?;
    println!(
        "Filter set to {} ({} quote(s) visible)",
        book.filter(),
        book.visible().len()
    );
    Ok(())
}

/// Clears session storage.
///
/// # Errors
///
/// Returns an error if session storage cannot be cleared.
pub fn cmd_session_end(ctx: &CliContext) -> Result<()> {
    let removed = ctx.lock()?.end_session()?;
    println!("Session cleared ({removed} entr{})", if removed == 1 { "y" } else { "ies" });
    Ok(())
}

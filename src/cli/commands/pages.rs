//! `wikit pages`: list, export and delete pages of one instance

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::*;

use crate::api::{BatchReport, Page, PageApi, WikiClient, delete_pages, export_pages};
use crate::cli::ui::{prompt_delete_confirmation, with_spinner};
use crate::config::Config;
use crate::tui::search::filter_pages;

#[derive(Args)]
pub struct PagesCommands {
    #[command(subcommand)]
    pub command: PagesSubcommands,
}

#[derive(Subcommand)]
pub enum PagesSubcommands {
    /// List pages, optionally fuzzy-filtered by title or path
    List {
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Write every page to a JSON file
    Export { file: PathBuf },
    /// Delete pages by id
    Delete {
        #[arg(required = true)]
        ids: Vec<u64>,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

pub async fn pages_command(args: PagesCommands, instance: Option<&str>) -> Result<()> {
    let config = Config::load()?;
    let resolved = config.resolve(instance)?;
    let client = WikiClient::new(&resolved.config)?;
    log::info!("Running pages command against '{}'", resolved.name);

    match args.command {
        PagesSubcommands::List { search } => list(&client, search.as_deref()).await,
        PagesSubcommands::Export { file } => {
            let summary = export_pages(&client, &file, Some(resolved.name.clone()), |message| {
                println!("  {}", message.dimmed())
            })
            .await?;
            println!(
                "{} Exported {} pages ({} published, {} unpublished) to {}",
                "✓".bright_green(),
                summary.total_pages,
                summary.published_pages,
                summary.unpublished_pages,
                file.display().to_string().cyan()
            );
            Ok(())
        }
        PagesSubcommands::Delete { ids, yes } => delete(&client, &ids, yes).await,
    }
}

async fn list(api: &dyn PageApi, search: Option<&str>) -> Result<()> {
    let pages = with_spinner("Loading pages...", api.list_pages()).await?;
    let order = filter_pages(&pages, search.unwrap_or(""));

    if order.is_empty() {
        println!("{}", "No pages found".bright_yellow());
        return Ok(());
    }

    let id_width = pages.iter().map(|p| p.id.to_string().len()).max().unwrap_or(2).max(2);
    println!(
        "{}  {:<6}  {}",
        format!("{:>width$}", "ID", width = id_width).bold(),
        "LOCALE".bold(),
        "PATH / TITLE".bold()
    );
    for page in order.iter().filter_map(|&i| pages.get(i)) {
        println!("{}", format_row(page, id_width));
    }
    println!();
    println!("{}", format!("{} of {} pages", order.len(), pages.len()).dimmed());
    Ok(())
}

fn format_row(page: &Page, id_width: usize) -> String {
    let path = if page.is_published {
        page.path.cyan()
    } else {
        page.path.yellow()
    };
    let draft = if page.is_published { "" } else { " (draft)" };
    format!(
        "{:>width$}  {:<6}  {} {}{}",
        page.id,
        page.locale,
        path,
        page.title.dimmed(),
        draft.yellow(),
        width = id_width
    )
}

/// Split requested ids into known pages (in request order) and unknown ids
pub fn select_pages(pages: &[Page], ids: &[u64]) -> (Vec<Page>, Vec<u64>) {
    let mut found = Vec::new();
    let mut missing = Vec::new();
    for id in ids {
        if found.iter().any(|p: &Page| p.id == *id) {
            continue;
        }
        match pages.iter().find(|p| p.id == *id) {
            Some(page) => found.push(page.clone()),
            None => missing.push(*id),
        }
    }
    (found, missing)
}

async fn delete(api: &dyn PageApi, ids: &[u64], yes: bool) -> Result<()> {
    let pages = with_spinner("Loading pages...", api.list_pages()).await?;
    let (targets, missing) = select_pages(&pages, ids);

    for id in &missing {
        println!("{} No page with id {}", "⚠".bright_yellow(), id);
    }
    if targets.is_empty() {
        anyhow::bail!("None of the requested pages exist");
    }

    println!("{}", "Pages to delete:".bright_white().bold());
    for page in &targets {
        println!("  • {}", page.label());
    }

    if !yes && !prompt_delete_confirmation(targets.len())? {
        println!("{}", "Cancelled".yellow());
        return Ok(());
    }

    let report = delete_pages(api, &targets, |i, total, page| {
        println!("  {} Deleting page {}/{}: {}", "→".dimmed(), i, total, page.path)
    })
    .await;
    print_report(&report);
    report.into_result().map(|_| ())
}

fn print_report(report: &BatchReport) {
    for failure in report.failures() {
        println!("  {} {}: {}", "✗".bright_red(), failure.item, failure.reason);
    }
    let summary = report.summary();
    if report.failed() == 0 {
        println!("{} {}", "✓".bright_green(), summary.bright_green());
    } else if report.all_failed() {
        println!("{} {}", "✗".bright_red(), summary.bright_red());
    } else {
        println!("{} {}", "⚠".bright_yellow(), summary.bright_yellow());
    }
}

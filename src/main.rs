//! Cardshelf CLI
//!
//! Command-line front end for the card collection engine.
//! Provides one-shot search and listing plus an interactive search mode.

use cardshelf::{
    format_date, AppConfig, CardStore, CollectionBrowser, MemoryCardStore, MemoryChatStore,
    RecentChats, SearchIndex, SearchMode, SortOrder,
};
use clap::{Parser, Subcommand};
use console::style;
use indicatif::HumanDuration;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Cardshelf - character card collection browser
#[derive(Parser)]
#[command(name = "cardshelf")]
#[command(author = "Cardshelf Contributors")]
#[command(version)]
#[command(about = "Search and browse character card collections", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search cards by name
    Search {
        /// JSON file with an array of cards
        #[arg(short, long)]
        cards: PathBuf,

        /// Search text (use -- before text if it starts with -)
        #[arg(allow_hyphen_values = true)]
        query: String,

        /// Plain substring matching instead of fuzzy
        #[arg(long)]
        substring: bool,

        /// Maximum results
        #[arg(short, long, default_value = "50")]
        max: usize,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List the collection
    List {
        /// JSON file with an array of cards
        #[arg(short, long)]
        cards: PathBuf,

        /// recently-added, alphabetical, newest or oldest
        #[arg(short, long)]
        sort: Option<SortOrder>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show the recent chats sidebar
    Chats {
        /// JSON file with an array of chat summaries
        #[arg(long)]
        chats: PathBuf,

        /// Chat to mark as open
        #[arg(long)]
        active: Option<u64>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Search as you type, one query per line (":q" quits)
    Interactive {
        /// JSON file with an array of cards
        #[arg(short, long)]
        cards: PathBuf,
    },
}

fn main() {
    if let Some(path) = cardshelf::logging::init() {
        tracing::info!(log = %path.display(), version = cardshelf::VERSION, "cardshelf starting up");
    }

    let cli = Cli::parse();

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Search {
            cards,
            query,
            substring,
            max,
            json,
        } => cmd_search(&config, &cards, &query, substring, max, json),

        Commands::List { cards, sort, json } => cmd_list(&config, &cards, sort, json),

        Commands::Chats {
            chats,
            active,
            json,
        } => cmd_chats(&chats, active, json),

        Commands::Interactive { cards } => cmd_interactive(&config, &cards),
    });

    if let Err(e) = result {
        tracing::error!(error = %e, "command failed");
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> cardshelf::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::from_json_file(path),
        None => Ok(AppConfig::default()),
    }
}

/// Search command implementation
fn cmd_search(
    config: &AppConfig,
    cards: &Path,
    query: &str,
    substring: bool,
    max: usize,
    json: bool,
) -> cardshelf::Result<()> {
    let store = MemoryCardStore::from_json_file(cards)?;
    let start = Instant::now();
    let index = SearchIndex::build(store.list_cards()?, config.search.clone());

    if json {
        let hits: Vec<_> = if substring {
            index
                .query_substring(query)
                .iter()
                .take(max)
                .map(|r| serde_json::json!({ "id": r.id, "name": r.name }))
                .collect()
        } else {
            index
                .query_scored(query)
                .iter()
                .take(max)
                .map(|h| {
                    serde_json::json!({
                        "id": h.record.id,
                        "name": h.record.name,
                        "score": h.score,
                        "errors": h.errors,
                    })
                })
                .collect()
        };
        println!("{}", serde_json::Value::Array(hits));
        return Ok(());
    }

    let mode = if substring { SearchMode::Substring } else { SearchMode::Fuzzy };
    println!(
        "{} Searching {} cards for '{}' ({})",
        style("→").cyan().bold(),
        index.len(),
        style(query).yellow(),
        mode.as_str()
    );

    let results = index.search(query, mode);
    println!();
    println!(
        "Found {} results in {}:",
        style(results.len()).green(),
        HumanDuration(start.elapsed())
    );
    println!();

    for (i, record) in results.iter().take(max).enumerate() {
        println!(
            "  {} {} {}",
            style(format!("{:3}.", i + 1)).dim(),
            style(&record.name).cyan(),
            style(format!("#{}", record.id)).dim()
        );
    }

    Ok(())
}

/// List command implementation
fn cmd_list(
    config: &AppConfig,
    cards: &Path,
    sort: Option<SortOrder>,
    json: bool,
) -> cardshelf::Result<()> {
    let store = MemoryCardStore::from_json_file(cards)?;
    let mut browser = CollectionBrowser::new(config);
    browser.sync_cards(&store);
    browser.set_sort(sort.or(config.default_sort));

    if json {
        println!("{}", serde_json::to_string_pretty(&browser.results().to_vec())?);
        return Ok(());
    }

    let label = browser.sort().map_or("Collection order", |s| s.label());
    println!("{} ({})", style(browser.status_line()).bold(), style(label).dim());
    println!();
    for record in browser.results().iter() {
        println!(
            "  {:<32} {} {}",
            style(&record.name).cyan(),
            style("added").dim(),
            format_date(&record.added_at)
        );
    }

    Ok(())
}

/// Chats command implementation
fn cmd_chats(chats: &Path, active: Option<u64>, json: bool) -> cardshelf::Result<()> {
    let store = MemoryChatStore::from_json_file(chats)?;
    let mut recent = RecentChats::new();
    recent.refresh(&store)?;
    if let Some(id) = active {
        recent.select(cardshelf::ChatId(id));
    }

    let views = recent.views();
    if json {
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }

    for view in views {
        let marker = if view.active { style("●").green() } else { style("○").dim() };
        println!("{} {}", marker, style(&view.name).bold());
        println!("    {}", style(&view.preview).dim());
    }

    Ok(())
}

/// Interactive search: every line replaces the query
fn cmd_interactive(config: &AppConfig, cards: &Path) -> cardshelf::Result<()> {
    let store = MemoryCardStore::from_json_file(cards)?;
    let mut browser = CollectionBrowser::new(config);
    browser.sync_cards(&store);

    println!(
        "{} {} loaded. Type to search, \":sort <order>\", \":mode fuzzy|substring\", \":q\" to quit.",
        style("→").cyan().bold(),
        browser.status_line()
    );

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    print_results(&browser);

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim() == ":q" {
            break;
        }

        if let Some(arg) = line.trim().strip_prefix(":sort") {
            let arg = arg.trim();
            if arg.is_empty() || arg == "none" {
                browser.set_sort(None);
            } else {
                match arg.parse::<SortOrder>() {
                    Ok(order) => browser.set_sort(Some(order)),
                    Err(e) => eprintln!("{} {}", style("Error:").red().bold(), e),
                }
            }
        } else if let Some(arg) = line.trim().strip_prefix(":mode") {
            match arg.trim().parse::<SearchMode>() {
                Ok(mode) => browser.set_mode(mode),
                Err(e) => eprintln!("{} {}", style("Error:").red().bold(), e),
            }
        } else {
            browser.set_query(&line);
        }

        print_results(&browser);
        stdout.flush()?;
    }

    Ok(())
}

fn print_results(browser: &CollectionBrowser) {
    println!();
    println!(
        "{} {}",
        style(browser.status_line()).bold(),
        style(format!("[v{}]", browser.results_version())).dim()
    );
    for record in browser.results().iter().take(20) {
        println!("  {}", style(&record.name).cyan());
    }
    if browser.results().len() > 20 {
        println!("  {}", style(format!("... {} more", browser.results().len() - 20)).dim());
    }
}

//! Engram CLI - Search, curate and tune a knowledge memory
//!
//! Talks to an Engram server over its HTTP API.

mod api;
mod config;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use dialoguer::{Confirm, Input, Password};
use std::fs;
use tracing_subscriber::EnvFilter;

use api::{ConfigUpdate, EngramClient, InteractionRequest, MemoryView, SaveRequest, Source};
use config::Config;

#[derive(Parser)]
#[command(name = "engram")]
#[command(about = "Engram CLI - Knowledge memory for AI coding sessions", long_about = None)]
#[command(version)]
struct Cli {
    /// Log HTTP traffic (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Login and store API key
    Login {
        /// API key (will prompt if not provided)
        #[arg(short, long)]
        key: Option<String>,
        /// Server URL to store alongside the key
        #[arg(short, long)]
        url: Option<String>,
    },

    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Check server and store health
    Health,

    /// Search memories
    Search {
        /// Search query
        query: String,
        /// semantic, keyword or hybrid
        #[arg(short, long)]
        mode: Option<String>,
        /// Only this kind (decision, fix, learning, ...)
        #[arg(short, long)]
        kind: Option<String>,
        /// Required tags (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        tags: Vec<String>,
        /// Max results (1-50)
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show the most recent memories
    Recent {
        /// Max results (1-50)
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Only this kind
        #[arg(short, long)]
        kind: Option<String>,
    },

    /// Store statistics
    Stats,

    /// Save a memory directly, without classification
    Save {
        /// Memory content (or use -f for file)
        content: Option<String>,
        /// Read content from file
        #[arg(short, long)]
        file: Option<String>,
        /// Memory kind (decision, fix, learning, pattern, preference, config, error, context, conversation)
        #[arg(short, long)]
        kind: String,
        /// Tags for categorization (comma-separated, e.g., "rust,auth")
        #[arg(short, long, value_delimiter = ',', required = true)]
        tags: Vec<String>,
        /// Short summary (max 200 characters)
        #[arg(short, long)]
        summary: Option<String>,
        /// Project (overrides default)
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Delete a memory
    Delete {
        /// Entry ID
        id: String,
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Show admission gate config and session counters
    Status,

    /// Change admission gate settings
    Tune {
        /// Turn automatic capture on or off
        #[arg(long)]
        enabled: Option<bool>,
        /// Minimum confidence (0.0-1.0, inclusive)
        #[arg(long)]
        min_confidence: Option<f32>,
        /// Kinds never captured automatically (comma-separated; "" clears)
        #[arg(long, value_delimiter = ',')]
        exclude: Option<Vec<String>>,
        /// Admissions per session
        #[arg(long)]
        max_per_session: Option<usize>,
        /// Deduplication window in minutes
        #[arg(long)]
        window: Option<u64>,
    },

    /// Offer an interaction to the admission gate
    Ingest {
        /// File holding the request text
        #[arg(long)]
        request: String,
        /// File holding the response text
        #[arg(long)]
        response: String,
        /// Session ID for quota accounting
        #[arg(short, long)]
        session: Option<String>,
        /// Originating tool (claude-code, codex, cursor, api, manual)
        #[arg(long, default_value = "manual")]
        tool: String,
        /// Project (overrides default)
        #[arg(short, long)]
        project: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set the server URL
    SetUrl { url: String },
    /// Set the default project ("" clears it)
    SetProject { name: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Login { key, url } => cmd_login(key, url).await,
        Commands::Config { action } => cmd_config(action.unwrap_or(ConfigAction::Show)),
        Commands::Health => cmd_health().await,
        Commands::Search { query, mode, kind, tags, limit } => {
            cmd_search(query, mode, kind, tags, limit).await
        }
        Commands::Recent { limit, kind } => cmd_recent(limit, kind).await,
        Commands::Stats => cmd_stats().await,
        Commands::Save { content, file, kind, tags, summary, project } => {
            cmd_save(content, file, kind, tags, summary, project).await
        }
        Commands::Delete { id, yes } => cmd_delete(id, yes).await,
        Commands::Status => cmd_status().await,
        Commands::Tune { enabled, min_confidence, exclude, max_per_session, window } => {
            let update = ConfigUpdate {
                enabled,
                min_confidence,
                exclude_kinds: exclude.map(|kinds| {
                    kinds.into_iter().filter(|k| !k.trim().is_empty()).collect()
                }),
                max_entries_per_session: max_per_session,
                deduplication_window_minutes: window,
            };
            cmd_tune(update).await
        }
        Commands::Ingest { request, response, session, tool, project } => {
            cmd_ingest(request, response, session, tool, project).await
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "engram_cli=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn client(config: &Config) -> EngramClient {
    EngramClient::new(&config.base_url, config.api_key.as_deref())
}

// ============================================
// Command Implementations
// ============================================

async fn cmd_login(key: Option<String>, url: Option<String>) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(url) = url {
        config.set_base_url(&url);
    }

    let api_key = match key {
        Some(k) => k,
        None => Password::new()
            .with_prompt("API Key")
            .interact()
            .context("Failed to read API key")?,
    };

    // Test connection against a protected route
    let client = EngramClient::new(&config.base_url, Some(&api_key));
    print!("Testing connection... ");

    match client.status().await {
        Ok(_) => println!("{}", "OK".green()),
        Err(e) => {
            println!("{}", "Failed".red());
            bail!("Could not connect to Engram API at {}: {}", config.base_url, e);
        }
    }

    config.set_api_key(api_key);
    config.save()?;

    println!("{} API key saved to {:?}", "✓".green(), Config::config_path()?);

    if config.default_project.is_none() {
        println!("\n{}", "Tip: record a project with every save:".yellow());
        println!("  engram config set-project <name>");
    }

    Ok(())
}

fn cmd_config(action: ConfigAction) -> Result<()> {
    let mut config = Config::load()?;

    match action {
        ConfigAction::Show => {
            println!("{}", "Configuration:".bold());
            println!("  Path: {:?}", Config::config_path()?);
            println!("  Base URL: {}", config.base_url);
            println!(
                "  API Key: {}",
                if config.api_key.is_some() { "Set".green() } else { "Not set".red() }
            );
            println!(
                "  Default Project: {}",
                config.default_project.as_deref().unwrap_or("None").cyan()
            );
        }
        ConfigAction::SetUrl { url } => {
            config.set_base_url(&url);
            config.save()?;
            println!("{} Base URL set to {}", "✓".green(), config.base_url);
        }
        ConfigAction::SetProject { name } => {
            config.set_default_project(&name);
            config.save()?;
            match &config.default_project {
                Some(p) => println!("{} Default project set to '{}'", "✓".green(), p),
                None => println!("{} Default project cleared", "✓".green()),
            }
        }
    }

    Ok(())
}

async fn cmd_health() -> Result<()> {
    let config = Config::load()?;
    let client = client(&config);

    let server_up = client.health().await.unwrap_or(false);
    println!(
        "Server {}: {}",
        config.base_url.dimmed(),
        if server_up { "OK".green() } else { "unreachable".red() }
    );
    if !server_up {
        bail!("Engram server is not reachable");
    }

    let store = client.store_health().await?;
    println!(
        "Store: {} {}",
        if store.ok { "OK".green() } else { "DOWN".red() },
        store.version.as_deref().unwrap_or("").dimmed()
    );
    println!("Server version: {}", store.server_version);

    Ok(())
}

async fn cmd_search(
    query: String,
    mode: Option<String>,
    kind: Option<String>,
    tags: Vec<String>,
    limit: usize,
) -> Result<()> {
    let config = Config::load()?;
    let results = client(&config)
        .search(&query, mode.as_deref(), kind.as_deref(), &tags, limit)
        .await?;

    if results.entries.is_empty() {
        println!("No memories found for '{}'", query);
        return Ok(());
    }

    println!(
        "{} of {} results for '{}' ({}):",
        results.entries.len().to_string().green(),
        results.total,
        query,
        results.mode.cyan()
    );
    for entry in &results.entries {
        print_entry(entry);
    }

    Ok(())
}

async fn cmd_recent(limit: usize, kind: Option<String>) -> Result<()> {
    let config = Config::load()?;
    let recent = client(&config).recent(limit, kind.as_deref()).await?;

    if recent.entries.is_empty() {
        println!("No memories yet.");
        return Ok(());
    }

    for entry in &recent.entries {
        print_entry(entry);
    }

    Ok(())
}

async fn cmd_stats() -> Result<()> {
    let config = Config::load()?;
    let stats = client(&config).stats().await?;

    println!("{}", "Store statistics:".bold());
    println!("  Entries: {}", stats.total_entries.to_string().green());
    println!("  Size: {}", stats.storage_size);
    println!("  Last updated: {}", stats.last_updated);

    println!("  {}", "By kind:".dimmed());
    for (kind, count) in &stats.entries_by_kind {
        println!("    {:<14} {}", kind.cyan(), count);
    }
    println!("  {}", "By source:".dimmed());
    for (source, count) in &stats.entries_by_source {
        println!("    {:<14} {}", source.cyan(), count);
    }

    Ok(())
}

async fn cmd_save(
    content: Option<String>,
    file: Option<String>,
    kind: String,
    tags: Vec<String>,
    summary: Option<String>,
    project: Option<String>,
) -> Result<()> {
    let config = Config::load()?;

    // Get content from file or argument
    let content = match (content, file.as_deref()) {
        (Some(c), None) => c,
        (None, Some(f)) => {
            fs::read_to_string(f).with_context(|| format!("Failed to read file: {}", f))?
        }
        (Some(_), Some(_)) => {
            bail!("Cannot specify both content and --file");
        }
        (None, None) => Input::new()
            .with_prompt("Memory content")
            .interact_text()
            .context("Failed to read input")?,
    };

    let request = SaveRequest {
        content,
        kind,
        tags,
        summary,
        source: Source {
            tool: "manual".to_string(),
            project: config.project(project),
            file,
            ..Default::default()
        },
    };

    let entry = client(&config).save(&request).await?;

    println!(
        "{} Memory saved [{}] {}",
        "✓".green(),
        entry.kind,
        entry.id.dimmed()
    );
    println!("  {}", truncate_string(&entry.content, 80).dimmed());

    Ok(())
}

async fn cmd_delete(id: String, yes: bool) -> Result<()> {
    let config = Config::load()?;

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete memory {}?", id))
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    client(&config).delete(&id).await?;
    println!("{} Memory {} deleted", "✓".green(), id);

    Ok(())
}

async fn cmd_status() -> Result<()> {
    let config = Config::load()?;
    let status = client(&config).status().await?;
    let gate = &status.config;

    println!("{}", "Admission gate:".bold());
    println!(
        "  Enabled: {}",
        if gate.enabled { "yes".green() } else { "no".red() }
    );
    println!("  Min confidence: {}", gate.min_confidence);
    println!(
        "  Excluded kinds: {}",
        if gate.exclude_kinds.is_empty() {
            "-".to_string()
        } else {
            gate.exclude_kinds.join(", ")
        }
    );
    println!("  Max per session: {}", gate.max_entries_per_session);
    println!("  Dedup window: {} min", gate.deduplication_window_minutes);

    if status.session_counts.is_empty() {
        println!("\nNo admissions yet.");
    } else {
        println!("\n{}", "Sessions:".bold());
        for (session, count) in &status.session_counts {
            println!(
                "  {:<24} {}/{}",
                session.cyan(),
                count,
                gate.max_entries_per_session
            );
        }
    }

    Ok(())
}

async fn cmd_tune(update: ConfigUpdate) -> Result<()> {
    if update.is_empty() {
        bail!("Nothing to change. See 'engram tune --help'.");
    }

    let config = Config::load()?;
    let gate = client(&config).tune(&update).await?;

    println!("{} Admission config updated", "✓".green());
    println!(
        "  enabled={} min_confidence={} max_per_session={} window={}min exclude=[{}]",
        gate.enabled,
        gate.min_confidence,
        gate.max_entries_per_session,
        gate.deduplication_window_minutes,
        gate.exclude_kinds.join(",")
    );

    Ok(())
}

async fn cmd_ingest(
    request_file: String,
    response_file: String,
    session: Option<String>,
    tool: String,
    project: Option<String>,
) -> Result<()> {
    let config = Config::load()?;

    let request = fs::read_to_string(&request_file)
        .with_context(|| format!("Failed to read file: {}", request_file))?;
    let response = fs::read_to_string(&response_file)
        .with_context(|| format!("Failed to read file: {}", response_file))?;

    let interaction = InteractionRequest {
        request,
        response,
        source: Source {
            tool,
            session_id: session,
            project: config.project(project),
            file: None,
        },
    };

    let outcome = client(&config).ingest(&interaction).await?;

    match outcome.entry.filter(|_| outcome.admitted) {
        Some(entry) => {
            println!("{} Admitted", "✓".green());
            print_entry(&entry);
        }
        None => println!("{} Not admitted", "-".yellow()),
    }

    Ok(())
}

fn print_entry(entry: &MemoryView) {
    let kind_badge = format!("[{}]", entry.kind).dimmed();
    let text = entry.summary.as_deref().unwrap_or(&entry.content);
    println!("  {} {} {}", entry.id.dimmed(), kind_badge, truncate_string(text, 60));

    let mut details = Vec::new();
    if !entry.tags.is_empty() {
        details.push(format!("#{}", entry.tags.join(" #")));
    }
    if let Some(project) = &entry.source.project {
        details.push(project.clone());
    }
    details.push(entry.source.tool.clone());
    details.push(entry.timestamp.clone());
    println!("      {}", details.join("  ").dimmed());
}

/// Truncate string safely for UTF-8 (by char count, not bytes)
fn truncate_string(s: &str, max_chars: usize) -> String {
    let chars: Vec<char> = s.chars().take(max_chars).collect();
    if s.chars().count() > max_chars {
        format!("{}...", chars.into_iter().collect::<String>())
    } else {
        s.to_string()
    }
}

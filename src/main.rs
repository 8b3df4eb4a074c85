use std::path::PathBuf;
use std::time::SystemTime;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use oxidaily::{DateFormat, ResolvedNote, Vault, VaultRegistry};

#[derive(Debug, Parser)]
#[command(name = "oxd", version, about = "Obsidian daily notes from the command line")]
struct Cli {
    /// Path to the Obsidian vault.
    #[arg(long, env = "OBSIDIAN_VAULT", global = true)]
    vault: Option<PathBuf>,

    /// Vault to pick from Obsidian's vault list when --vault is not given.
    #[arg(long, env = "OBSIDIAN_VAULT_NAME", global = true)]
    vault_name: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create today's daily note, or find it if it already exists.
    Daily {
        /// Use this day instead of today (YYYY-MM-DD).
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Preview a moment.js date format.
    Format {
        /// Format string, e.g. "MMM DD YYYY".
        format: String,

        /// Render this day instead of today (YYYY-MM-DD).
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Create a note at the vault root; a taken name gets a counter.
    New {
        title: String,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Find notes by title, then by content.
    Search {
        query: String,

        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// List the most recently modified notes.
    Recent {
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// List vaults registered with Obsidian.
    Vaults,
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Daily { date, json } => {
            let vault = resolve_vault(cli.vault, cli.vault_name.as_deref())?;
            let note = vault.daily_note(resolve_now(date))?;
            print_note(&note, json)?;
        }
        Command::Format { format, date } => {
            let program = DateFormat::compile(&format)?;
            println!("{}", program.render(resolve_now(date)));
        }
        Command::New { title, json } => {
            let vault = resolve_vault(cli.vault, cli.vault_name.as_deref())?;
            let note = vault.new_note(&title, Local::now().naive_local())?;
            print_note(&note, json)?;
        }
        Command::Search { query, limit } => {
            let vault = resolve_vault(cli.vault, cli.vault_name.as_deref())?;
            for hit in vault.search_notes(&query, limit) {
                println!(
                    "{}\t{}\t{}",
                    hit.note.rel_path.as_str_lossy(),
                    local_day(hit.note.modified),
                    hit.preview
                );
            }
        }
        Command::Recent { limit } => {
            let vault = resolve_vault(cli.vault, cli.vault_name.as_deref())?;
            for note in vault.recent_notes(limit) {
                println!("{}\t{}", note.rel_path.as_str_lossy(), local_day(note.modified));
            }
        }
        Command::Vaults => {
            let registry = VaultRegistry::from_obsidian_config()?;
            for entry in registry.entries() {
                println!("{}\t{}", entry.name, entry.root.display());
            }
        }
    }

    Ok(())
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_vault(path: Option<PathBuf>, name: Option<&str>) -> anyhow::Result<Vault> {
    if let Some(path) = path {
        return Ok(Vault::open(path)?);
    }
    let registry = VaultRegistry::from_obsidian_config()?;
    let entry = registry.select(name)?;
    Ok(Vault::open(&entry.root)?)
}

/// The given day at the current local time of day, or now.
fn resolve_now(date: Option<NaiveDate>) -> NaiveDateTime {
    let now = Local::now().naive_local();
    match date {
        Some(date) => date.and_time(now.time()),
        None => now,
    }
}

fn local_day(at: SystemTime) -> String {
    DateTime::<Local>::from(at).format("%Y-%m-%d").to_string()
}

fn print_note(note: &ResolvedNote, json: bool) -> anyhow::Result<()> {
    if json {
        let out = serde_json::json!({
            "path": note.path.to_string_lossy(),
            "rel_path": note.rel_path.as_str_lossy(),
            "created": note.created,
        });
        println!("{}", serde_json::to_string(&out)?);
        return Ok(());
    }

    let state = if note.created { "created" } else { "found" };
    println!("{state}\t{}", note.path.display());
    Ok(())
}

//! Collaborative pixel board CLI.
//!
//! Reads `place.toml` (or `--config`), opens the SQLite store, seeds the board
//! on first use, and runs one command against it.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use serde_json::Value;

use place::board::{Board, BoardError, InitOutcome, Mutation, PurgeOutcome};
use place::exit_codes;
use place::io::config::{PlaceConfig, load_config};
use place::io::invalidator::FanoutInvalidator;
use place::io::kv::{KvStore, SqliteKvStore};
use place::logging;

#[derive(Parser)]
#[command(name = "place", version, about = "Collaborative pixel board")]
struct Cli {
    /// Config file (missing file means defaults).
    #[arg(long, global = true, default_value = "place.toml")]
    config: PathBuf,

    /// Override the database path from the config file.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Seed the selected color and every pixel if the board is new.
    Init,
    /// Change the selected color (leading `#` optional, any case).
    Select { color: String },
    /// Paint a pixel with the selected color.
    Paint {
        #[arg(allow_hyphen_values = true)]
        x: String,
        #[arg(allow_hyphen_values = true)]
        y: String,
    },
    /// Print the color of one pixel.
    Pixel {
        #[arg(allow_hyphen_values = true)]
        x: String,
        #[arg(allow_hyphen_values = true)]
        y: String,
    },
    /// Print the selected color.
    Selected,
    /// Print the whole board.
    Show {
        /// Emit the snapshot as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration as TOML.
    Config,
    /// Raw key-value store access.
    #[command(subcommand)]
    Kv(KvCommand),
}

#[derive(Subcommand)]
enum KvCommand {
    /// Print the JSON value stored under a key.
    Get { key: String },
    /// Store a JSON value (quote strings: '"text"').
    Set { key: String, value: String },
    /// Remove a key (no-op when absent).
    Delete { key: String },
    /// List entries, optionally only keys starting with a prefix.
    List { prefix: Option<String> },
}

type CliBoard = Board<SqliteKvStore, FanoutInvalidator>;

fn main() {
    logging::init();
    let code = match run() {
        Ok(()) => exit_codes::OK,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_code_for(&err)
        }
    };
    process::exit(code);
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<BoardError>() {
        Some(board_err) if board_err.is_validation() => exit_codes::INVALID_INPUT,
        _ => exit_codes::FAILURE,
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let cfg = load_config(&cli.config)?;
    let db_path = cli
        .db
        .clone()
        .unwrap_or_else(|| cfg.resolve_database_path(&cli.config));

    match cli.command {
        Command::Config => cmd_config(&cfg),
        Command::Kv(kv) => cmd_kv(&open_store(&db_path)?, kv),
        Command::Init => cmd_init(&open_board(&cfg, &db_path)?),
        Command::Select { color } => cmd_select(&ready_board(&cfg, &db_path)?, &color),
        Command::Paint { x, y } => cmd_paint(&ready_board(&cfg, &db_path)?, &x, &y),
        Command::Pixel { x, y } => cmd_pixel(&ready_board(&cfg, &db_path)?, &x, &y),
        Command::Selected => cmd_selected(&ready_board(&cfg, &db_path)?),
        Command::Show { json } => cmd_show(&ready_board(&cfg, &db_path)?, json),
    }
}

fn open_store(db_path: &Path) -> Result<SqliteKvStore> {
    let store = SqliteKvStore::open(db_path)
        .with_context(|| format!("open database {}", db_path.display()))?;
    store.init_schema()?;
    Ok(store)
}

fn open_board(cfg: &PlaceConfig, db_path: &Path) -> Result<CliBoard> {
    Ok(Board::new(
        open_store(db_path)?,
        cfg.invalidator(),
        cfg.board_config()?,
    ))
}

/// Open the board and bring it to ready, seeding it if new.
fn ready_board(cfg: &PlaceConfig, db_path: &Path) -> Result<CliBoard> {
    let board = open_board(cfg, db_path)?;
    board.initialize().context("initialize board")?;
    Ok(board)
}

fn cmd_init(board: &CliBoard) -> Result<()> {
    match board.initialize()? {
        InitOutcome::Seeded { pixels } => println!("seeded {pixels} pixels"),
        InitOutcome::AlreadySeeded => println!("board ready"),
    }
    Ok(())
}

fn cmd_select(board: &CliBoard, color: &str) -> Result<()> {
    let color = if color.starts_with('#') {
        color.to_string()
    } else {
        format!("#{color}")
    };
    let mutation = board.select_color(&color)?;
    println!("selected {}", mutation.color);
    report_purge(&mutation);
    Ok(())
}

fn cmd_paint(board: &CliBoard, x: &str, y: &str) -> Result<()> {
    let coord = board.parse_coordinate(x, y).map_err(BoardError::from)?;
    let mutation = board.paint_at(coord)?;
    println!("painted {coord} {}", mutation.color);
    report_purge(&mutation);
    Ok(())
}

fn cmd_pixel(board: &CliBoard, x: &str, y: &str) -> Result<()> {
    let coord = board.parse_coordinate(x, y).map_err(BoardError::from)?;
    println!("{}", board.read_pixel_at(coord)?);
    Ok(())
}

fn cmd_selected(board: &CliBoard) -> Result<()> {
    println!("{}", board.read_selected_color()?);
    Ok(())
}

fn cmd_show(board: &CliBoard, json: bool) -> Result<()> {
    let snapshot = board.snapshot()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }
    println!("selected: {}", snapshot.selected);
    for row in &snapshot.rows {
        let line: Vec<&str> = row.iter().map(|c| c.as_str()).collect();
        println!("{}", line.join(" "));
    }
    Ok(())
}

fn cmd_config(cfg: &PlaceConfig) -> Result<()> {
    print!("{}", toml::to_string_pretty(cfg).context("serialize config toml")?);
    Ok(())
}

fn cmd_kv(store: &SqliteKvStore, command: KvCommand) -> Result<()> {
    match command {
        KvCommand::Get { key } => {
            let value: Value = store
                .get(&key)?
                .ok_or_else(|| anyhow!("no entry for key \"{key}\""))?;
            println!("{value}");
        }
        KvCommand::Set { key, value } => {
            let value: Value = serde_json::from_str(&value)
                .with_context(|| format!("value for \"{key}\" must be JSON"))?;
            store.set(&key, &value)?;
        }
        KvCommand::Delete { key } => store.delete(&key)?,
        KvCommand::List { prefix } => {
            for entry in store.list::<Value>(prefix.as_deref())? {
                println!("{}\t{}\t{}", entry.key, entry.value, entry.updated_at);
            }
        }
    }
    Ok(())
}

fn report_purge(mutation: &Mutation) {
    if let PurgeOutcome::Failed { error, .. } = &mutation.purge {
        eprintln!("warning: board updated but cache purge failed: {error}");
    }
}

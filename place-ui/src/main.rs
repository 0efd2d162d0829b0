//! Place UI server - serves the board as SVG images and an HTML page.

mod error;
mod render;
mod routes;
mod sse;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use axum::Router;
use axum::routing::get;
use clap::Parser;
use place::board::{Board, InitOutcome};
use place::io::config::load_config;
use place::io::kv::SqliteKvStore;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::render::Renderer;
use crate::state::{AppState, BroadcastInvalidator};

#[derive(Parser)]
#[command(name = "place-ui")]
#[command(about = "Web server for the collaborative pixel board")]
struct Args {
    /// Address to bind the server to
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,

    /// Port to listen on
    #[arg(long, default_value = "3002")]
    port: u16,

    /// Path to the board config file
    #[arg(long, default_value = "place.toml")]
    config: PathBuf,

    /// Database path (overrides the config file)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Absolute URL clients reach this server at (defaults to the bind address)
    #[arg(long)]
    public_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("place_ui=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let cfg = load_config(&args.config)?;
    let board_config = cfg.board_config()?;
    let db_path = args
        .db
        .clone()
        .unwrap_or_else(|| cfg.resolve_database_path(&args.config));
    info!(db = %db_path.display(), board_size = cfg.board_size, "starting place-ui");

    let store = SqliteKvStore::open(&db_path)
        .with_context(|| format!("failed to open database {}", db_path.display()))?;
    store.init_schema()?;

    let (event_tx, _) = broadcast::channel(256);
    let mut invalidator = cfg.invalidator();
    invalidator.push(Box::new(BroadcastInvalidator::new(event_tx.clone())));

    let board = Board::new(store, invalidator, board_config);
    match board.initialize()? {
        InitOutcome::Seeded { pixels } => info!(pixels, "seeded new board"),
        InitOutcome::AlreadySeeded => info!("board already seeded"),
    }

    let public_url = args
        .public_url
        .unwrap_or_else(|| format!("http://{}:{}", args.bind, args.port));
    let state = AppState::new(board, Renderer::new()?, public_url, event_tx);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(routes::board_router())
        .nest("/api", routes::api_router())
        .route("/events", get(sse::events_handler))
        .layer(cors)
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

//! Shared application state for the board server.

use std::sync::Arc;

use place::board::{Board, BoardError};
use place::io::invalidator::{CacheInvalidator, FanoutInvalidator, InvalidationError};
use place::io::kv::SqliteKvStore;
use tokio::sync::broadcast;

use crate::error::AppError;
use crate::render::Renderer;

pub type AppBoard = Board<SqliteKvStore, FanoutInvalidator>;

/// Events broadcast to SSE clients when the board changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    PixelPainted { x: u32, y: u32, color: String },
    ColorSelected { color: String },
    /// Cached renderings that are now stale.
    Invalidated { resources: Vec<String> },
}

/// Shared state accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub board: Arc<AppBoard>,
    pub renderer: Arc<Renderer>,
    /// Absolute URL the server is reachable at, used for `/raw` links.
    pub public_url: String,
    /// Broadcast sender for board change events.
    pub event_tx: Arc<broadcast::Sender<ChangeEvent>>,
}

impl AppState {
    pub fn new(
        board: AppBoard,
        renderer: Renderer,
        public_url: String,
        event_tx: broadcast::Sender<ChangeEvent>,
    ) -> Self {
        Self {
            board: Arc::new(board),
            renderer: Arc::new(renderer),
            public_url,
            event_tx: Arc::new(event_tx),
        }
    }

    /// Run a board operation on the blocking pool; the store and purge
    /// command both block.
    pub async fn with_board<T, F>(&self, op: F) -> Result<T, AppError>
    where
        F: FnOnce(&AppBoard) -> Result<T, BoardError> + Send + 'static,
        T: Send + 'static,
    {
        let board = Arc::clone(&self.board);
        let result = tokio::task::spawn_blocking(move || op(&board)).await?;
        Ok(result?)
    }

    pub fn publish(&self, event: ChangeEvent) {
        // No subscribers is fine.
        let _ = self.event_tx.send(event);
    }
}

/// Forwards stale resource identifiers to connected browsers.
pub struct BroadcastInvalidator {
    tx: broadcast::Sender<ChangeEvent>,
}

impl BroadcastInvalidator {
    pub fn new(tx: broadcast::Sender<ChangeEvent>) -> Self {
        Self { tx }
    }
}

impl CacheInvalidator for BroadcastInvalidator {
    fn purge(&self, resources: &[String]) -> Result<(), InvalidationError> {
        let _ = self.tx.send(ChangeEvent::Invalidated {
            resources: resources.to_vec(),
        });
        Ok(())
    }
}

//! Board state: validated paint/select operations over the key-value store.
//!
//! The board is stored as `board_size² + 1` independent entries (one per pixel
//! plus the selected color). Every mutation is two phases with no rollback:
//!
//! 1. validate fully, then write one key;
//! 2. tell the [`CacheInvalidator`] which cached renderings are stale.
//!
//! A phase-2 failure is logged and carried in the returned [`Mutation`], never
//! surfaced as a failed mutation, because the write has already committed.
//!
//! Pixels without a stored value read as the palette's first color. Seeding
//! normally writes every pixel, but `initialize` only checks the selected-color
//! key, so an interrupted seed (or a board resize) can leave gaps that this
//! fallback covers.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use serde::de::Error as _;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::coord::{Coordinate, all_coordinates};
use crate::core::keys::{PIXEL_PREFIX, SELECTED_COLOR_KEY, parse_pixel_key, pixel_key};
use crate::core::palette::{Color, Palette};
use crate::core::resource::InvalidationTargets;
use crate::core::validation::ValidationError;
use crate::io::invalidator::{CacheInvalidator, InvalidationError};
use crate::io::kv::{KvError, KvStore};

#[derive(Debug, Error)]
pub enum BoardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] KvError),

    #[error("board is not initialized")]
    NotInitialized,
}

impl BoardError {
    /// True when the caller sent bad input (as opposed to a runtime failure).
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Fixed board parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    board_size: u32,
    palette: Palette,
    targets: InvalidationTargets,
}

impl BoardConfig {
    pub fn new(board_size: u32, palette: Palette) -> Self {
        Self {
            board_size,
            palette,
            targets: InvalidationTargets::default(),
        }
    }

    pub fn with_targets(mut self, targets: InvalidationTargets) -> Self {
        self.targets = targets;
        self
    }

    pub fn board_size(&self) -> u32 {
        self.board_size
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn targets(&self) -> &InvalidationTargets {
        &self.targets
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::new(4, Palette::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// Selected color and every pixel were written.
    Seeded { pixels: usize },
    /// Selected color already present; nothing written.
    AlreadySeeded,
}

/// Result of the invalidation phase of a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurgeOutcome {
    Purged { resources: Vec<String> },
    Failed {
        resources: Vec<String>,
        error: InvalidationError,
    },
}

impl PurgeOutcome {
    pub fn is_purged(&self) -> bool {
        matches!(self, Self::Purged { .. })
    }
}

/// A committed board write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub key: String,
    pub color: Color,
    pub purge: PurgeOutcome,
}

/// The whole board read in one scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardSnapshot {
    pub board_size: u32,
    pub selected: Color,
    /// Row-major: `rows[y][x]`.
    pub rows: Vec<Vec<Color>>,
}

impl BoardSnapshot {
    /// `None` when `coord` lies outside this snapshot's board.
    pub fn color_at(&self, coord: Coordinate) -> Option<&Color> {
        self.rows
            .get(coord.y() as usize)?
            .get(coord.x() as usize)
    }
}

/// The board service. Owns its store handle, invalidator and configuration.
pub struct Board<S, I> {
    store: S,
    invalidator: I,
    config: BoardConfig,
    ready: AtomicBool,
}

impl<S: KvStore, I: CacheInvalidator> Board<S, I> {
    pub fn new(store: S, invalidator: I, config: BoardConfig) -> Self {
        Self {
            store,
            invalidator,
            config,
            ready: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Seed the board if the selected-color key is absent, then mark ready.
    ///
    /// Only the selected-color key is checked. If a previous seed was
    /// interrupted, the missing pixels stay missing and read as the default
    /// color. A storage failure mid-seed leaves the pixels written so far.
    pub fn initialize(&self) -> Result<InitOutcome, BoardError> {
        let existing: Option<String> = self.store.get(SELECTED_COLOR_KEY)?;
        let outcome = if existing.is_some() {
            debug!("board already seeded");
            InitOutcome::AlreadySeeded
        } else {
            let default = self.config.palette.default_color();
            self.store.set(SELECTED_COLOR_KEY, default)?;
            let mut pixels = 0;
            for coord in all_coordinates(self.config.board_size) {
                self.store
                    .set(&pixel_key(coord, self.config.board_size), default)?;
                pixels += 1;
            }
            info!(pixels, color = %default, "seeded board");
            InitOutcome::Seeded { pixels }
        };
        self.ready.store(true, Ordering::Release);
        Ok(outcome)
    }

    /// Validate `(x, y)` against this board's size.
    pub fn coordinate(&self, x: i64, y: i64) -> Result<Coordinate, ValidationError> {
        Coordinate::new(x, y, self.config.board_size)
    }

    /// Validate textual `(x, y)` input against this board's size.
    pub fn parse_coordinate(&self, x: &str, y: &str) -> Result<Coordinate, ValidationError> {
        Coordinate::parse(x, y, self.config.board_size)
    }

    pub fn select_color(&self, color: &str) -> Result<Mutation, BoardError> {
        self.ensure_ready()?;
        let color = self.config.palette.parse(color)?;
        self.store.set(SELECTED_COLOR_KEY, &color)?;
        debug!(color = %color, "selected color");
        let purge = self.purge(self.config.targets.for_select());
        Ok(Mutation {
            key: SELECTED_COLOR_KEY.to_string(),
            color,
            purge,
        })
    }

    pub fn paint(&self, x: i64, y: i64) -> Result<Mutation, BoardError> {
        self.ensure_ready()?;
        let coord = self.coordinate(x, y)?;
        self.paint_at(coord)
    }

    /// Paint an already-validated coordinate with the current selection.
    ///
    /// The selection is read at paint time; a concurrent `select_color` may or
    /// may not be observed.
    pub fn paint_at(&self, coord: Coordinate) -> Result<Mutation, BoardError> {
        self.ensure_ready()?;
        let coord = self.coordinate(i64::from(coord.x()), i64::from(coord.y()))?;
        let color = self.stored_color(SELECTED_COLOR_KEY)?;
        let key = pixel_key(coord, self.config.board_size);
        self.store.set(&key, &color)?;
        debug!(%coord, color = %color, "painted pixel");
        let purge = self.purge(self.config.targets.for_paint(coord));
        Ok(Mutation { key, color, purge })
    }

    pub fn read_pixel(&self, x: i64, y: i64) -> Result<Color, BoardError> {
        self.ensure_ready()?;
        let coord = self.coordinate(x, y)?;
        self.read_pixel_at(coord)
    }

    pub fn read_pixel_at(&self, coord: Coordinate) -> Result<Color, BoardError> {
        self.ensure_ready()?;
        let coord = self.coordinate(i64::from(coord.x()), i64::from(coord.y()))?;
        self.stored_color(&pixel_key(coord, self.config.board_size))
    }

    pub fn read_selected_color(&self) -> Result<Color, BoardError> {
        self.ensure_ready()?;
        self.stored_color(SELECTED_COLOR_KEY)
    }

    /// Selected color plus every pixel, from one prefix scan.
    pub fn snapshot(&self) -> Result<BoardSnapshot, BoardError> {
        self.ensure_ready()?;
        let size = self.config.board_size;
        let default = self.config.palette.default_color().clone();
        let mut rows = vec![vec![default; size as usize]; size as usize];

        // Filter on the key before decoding: other values may share the prefix.
        for raw in self.store.list_encoded(Some(PIXEL_PREFIX))? {
            let Some((x, y)) = parse_pixel_key(&raw.key) else {
                continue;
            };
            let Ok(coord) = self.coordinate(i64::from(x), i64::from(y)) else {
                continue;
            };
            // Keys written under another board size's padding are ignored.
            if raw.key != pixel_key(coord, size) {
                continue;
            }
            let entry = raw.decode::<String>()?;
            rows[y as usize][x as usize] = self.palette_color(&entry.key, &entry.value)?;
        }

        Ok(BoardSnapshot {
            board_size: size,
            selected: self.stored_color(SELECTED_COLOR_KEY)?,
            rows,
        })
    }

    fn ensure_ready(&self) -> Result<(), BoardError> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(BoardError::NotInitialized)
        }
    }

    fn stored_color(&self, key: &str) -> Result<Color, BoardError> {
        match self.store.get::<String>(key)? {
            Some(value) => self.palette_color(key, &value),
            None => Ok(self.config.palette.default_color().clone()),
        }
    }

    fn palette_color(&self, key: &str, value: &str) -> Result<Color, BoardError> {
        self.config.palette.find(value).cloned().ok_or_else(|| {
            BoardError::Store(KvError::CorruptValue {
                key: key.to_string(),
                source: serde_json::Error::custom(format!(
                    "stored color '{value}' is not in the palette"
                )),
            })
        })
    }

    fn purge(&self, resources: Vec<String>) -> PurgeOutcome {
        match self.invalidator.purge(&resources) {
            Ok(()) => PurgeOutcome::Purged { resources },
            Err(error) => {
                warn!(error = %error, ?resources, "cache invalidation failed after committed write");
                PurgeOutcome::Failed { resources, error }
            }
        }
    }
}

//! End-to-end board scenarios against the SQLite store.
//!
//! Runs the documented 4x4 walkthrough in order on one database file:
//! fresh start, select, paint, rejected paint, rejected select, pixel scan.

use std::sync::Arc;

use place::board::{Board, BoardConfig, BoardError, InitOutcome};
use place::core::coord::all_coordinates;
use place::core::palette::{DEFAULT_PALETTE, Palette};
use place::core::validation::ValidationError;
use place::io::kv::{Entry, KvStore, SqliteKvStore};
use place::test_support::RecordingInvalidator;

const C0: &str = DEFAULT_PALETTE[0];
const C3: &str = DEFAULT_PALETTE[3];

fn open(path: &std::path::Path) -> (Board<SqliteKvStore, Arc<RecordingInvalidator>>, Arc<RecordingInvalidator>) {
    let recorder = Arc::new(RecordingInvalidator::new());
    let store = SqliteKvStore::open(path).expect("open store");
    let config = BoardConfig::new(4, Palette::new(&DEFAULT_PALETTE).expect("palette"));
    (Board::new(store, Arc::clone(&recorder), config), recorder)
}

fn all_pixels(board: &Board<SqliteKvStore, Arc<RecordingInvalidator>>) -> Vec<String> {
    all_coordinates(4)
        .map(|c| board.read_pixel_at(c).expect("pixel").to_string())
        .collect()
}

#[test]
fn documented_walkthrough() {
    let temp = tempfile::tempdir().expect("tempdir");
    let db = temp.path().join("place.db");
    let (board, recorder) = open(&db);

    // 1. Fresh start.
    assert_eq!(
        board.initialize().expect("init"),
        InitOutcome::Seeded { pixels: 16 }
    );
    assert_eq!(board.read_selected_color().expect("selected").as_str(), C0);
    assert!(all_pixels(&board).iter().all(|c| c == C0));

    // 2. Select C3.
    board.select_color(C3).expect("select");
    assert_eq!(board.read_selected_color().expect("selected").as_str(), C3);

    // 3. Paint (2,1); every other pixel unchanged.
    board.paint(2, 1).expect("paint");
    for coord in all_coordinates(4) {
        let color = board.read_pixel_at(coord).expect("pixel");
        let expected = if (coord.x(), coord.y()) == (2, 1) { C3 } else { C0 };
        assert_eq!(color.as_str(), expected, "{coord}");
    }
    let after_paint = all_pixels(&board);

    // 4. Off-board paint is rejected and changes nothing.
    let err = board.paint(5, 0).expect_err("off board");
    assert!(matches!(
        err,
        BoardError::Validation(ValidationError::InvalidCoordinate { .. })
    ));
    assert_eq!(all_pixels(&board), after_paint);

    // 5. Unknown color is rejected; selection unchanged.
    let err = board.select_color("not-a-color").expect_err("bad color");
    assert!(matches!(
        err,
        BoardError::Validation(ValidationError::InvalidColor { .. })
    ));
    assert_eq!(board.read_selected_color().expect("selected").as_str(), C3);

    // 6. Prefix scan returns the 16 pixels in key order.
    let pixels: Vec<Entry<String>> = board.store().list(Some("pixel:")).expect("list");
    assert_eq!(pixels.len(), 16);
    let keys: Vec<&str> = pixels.iter().map(|e| e.key.as_str()).collect();
    let mut sorted = keys.clone();
    sorted.sort_unstable();
    assert_eq!(keys, sorted);
    assert!(pixels.iter().any(|e| e.key == "pixel:2:1" && e.value == C3));

    // One purge per successful mutation, none for rejected ones.
    assert_eq!(
        recorder.calls(),
        vec![
            vec!["/selected".to_string()],
            vec!["/pixel?x=2&y=1".to_string()],
        ]
    );
}

#[test]
fn reopening_does_not_reseed() {
    let temp = tempfile::tempdir().expect("tempdir");
    let db = temp.path().join("place.db");
    {
        let (board, _) = open(&db);
        board.initialize().expect("init");
        board.select_color(C3).expect("select");
        board.paint(0, 0).expect("paint");
    }

    let (board, _) = open(&db);
    assert_eq!(board.initialize().expect("init"), InitOutcome::AlreadySeeded);
    assert_eq!(board.read_pixel(0, 0).expect("pixel").as_str(), C3);
    assert_eq!(board.read_selected_color().expect("selected").as_str(), C3);
}

#[test]
fn concurrent_painters_on_shared_board() {
    let temp = tempfile::tempdir().expect("tempdir");
    let db = temp.path().join("place.db");
    let (board, recorder) = open(&db);
    board.initialize().expect("init");
    board.select_color(C3).expect("select");
    let board = Arc::new(board);

    let handles: Vec<_> = all_coordinates(4)
        .map(|coord| {
            let board = Arc::clone(&board);
            std::thread::spawn(move || board.paint_at(coord).expect("paint"))
        })
        .collect();
    for handle in handles {
        handle.join().expect("join");
    }

    assert!(all_pixels(&board).iter().all(|c| c == C3));
    assert_eq!(recorder.calls().len(), 17);
}

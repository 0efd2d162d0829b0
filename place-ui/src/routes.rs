//! HTTP route handlers.
//!
//! Image routes answer with SVG. Mutations redirect back to the page that
//! linked them, which is how a README click round-trips through the server.

use axum::Router;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Json, Redirect, Response};
use axum::routing::get;
use place::board::BoardSnapshot;
use serde::Deserialize;

use crate::error::AppError;
use crate::render::PIXEL_SIZE;
use crate::state::{AppState, ChangeEvent};

const SVG: &str = "image/svg+xml";
const NO_CACHE: &str = "no-cache";
const ONE_DAY: &str = "max-age=86400";

/// Board pages and images.
pub fn board_router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/pixel", get(pixel))
        .route("/selected", get(selected))
        .route("/static", get(static_swatch))
        .route("/paint", get(paint))
        .route("/select-color", get(select_color))
        .route("/raw", get(raw))
}

/// JSON endpoints, nested under `/api`.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/board", get(get_board))
}

#[derive(Debug, Default, Deserialize)]
struct CoordQuery {
    #[serde(default)]
    x: String,
    #[serde(default)]
    y: String,
}

#[derive(Debug, Default, Deserialize)]
struct PaintQuery {
    #[serde(default)]
    x: String,
    #[serde(default)]
    y: String,
    redirect: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ColorQuery {
    #[serde(default)]
    color: String,
    redirect: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuery {
    base_url: Option<String>,
    image_size: Option<u32>,
    redirect: Option<String>,
}

fn svg(body: String, cache_control: &'static str) -> Response {
    (
        [(header::CONTENT_TYPE, SVG), (header::CACHE_CONTROL, cache_control)],
        body,
    )
        .into_response()
}

/// Query strings cannot carry a bare `#`, so links send hex digits only.
fn with_hash(color: &str) -> String {
    if color.starts_with('#') {
        color.to_string()
    } else {
        format!("#{color}")
    }
}

fn back_to(redirect: Option<&str>) -> Redirect {
    match redirect {
        Some(target) if !target.is_empty() => Redirect::to(target),
        _ => Redirect::to("/"),
    }
}

async fn health() -> &'static str {
    "ok"
}

/// GET /api/board - the whole board as JSON.
async fn get_board(State(state): State<AppState>) -> Result<Json<BoardSnapshot>, AppError> {
    let snapshot = state.with_board(|board| board.snapshot()).await?;
    Ok(Json(snapshot))
}

/// GET /pixel?x&y - one cell.
async fn pixel(
    State(state): State<AppState>,
    Query(query): Query<CoordQuery>,
) -> Result<Response, AppError> {
    let color = state
        .with_board(move |board| {
            let coord = board.parse_coordinate(&query.x, &query.y)?;
            board.read_pixel_at(coord)
        })
        .await?;
    Ok(svg(state.renderer.swatch(&color)?, NO_CACHE))
}

/// GET /selected - the color the next paint will use.
async fn selected(State(state): State<AppState>) -> Result<Response, AppError> {
    let color = state
        .with_board(|board| board.read_selected_color())
        .await?;
    Ok(svg(state.renderer.swatch(&color)?, NO_CACHE))
}

/// GET /static?color - a palette swatch. Never changes, so long-cacheable.
async fn static_swatch(
    State(state): State<AppState>,
    Query(query): Query<ColorQuery>,
) -> Result<Response, AppError> {
    let color = state
        .board
        .config()
        .palette()
        .parse(&with_hash(&query.color))?;
    Ok(svg(state.renderer.swatch(&color)?, ONE_DAY))
}

/// GET /paint?x&y&redirect
async fn paint(
    State(state): State<AppState>,
    Query(query): Query<PaintQuery>,
) -> Result<Redirect, AppError> {
    let (x, y) = (query.x, query.y);
    let (coord, mutation) = state
        .with_board(move |board| {
            let coord = board.parse_coordinate(&x, &y)?;
            Ok((coord, board.paint_at(coord)?))
        })
        .await?;
    state.publish(ChangeEvent::PixelPainted {
        x: coord.x(),
        y: coord.y(),
        color: mutation.color.to_string(),
    });
    Ok(back_to(query.redirect.as_deref()))
}

/// GET /select-color?color&redirect
async fn select_color(
    State(state): State<AppState>,
    Query(query): Query<ColorQuery>,
) -> Result<Redirect, AppError> {
    let color = with_hash(&query.color);
    let mutation = state
        .with_board(move |board| board.select_color(&color))
        .await?;
    state.publish(ChangeEvent::ColorSelected {
        color: mutation.color.to_string(),
    });
    Ok(back_to(query.redirect.as_deref()))
}

/// GET /raw?baseUrl&imageSize&redirect - snippet to paste into a README.
async fn raw(
    State(state): State<AppState>,
    Query(query): Query<RawQuery>,
) -> Result<Response, AppError> {
    let config = state.board.config();
    let base_url = query
        .base_url
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| state.public_url.clone());
    let body = state.renderer.raw(
        config.palette(),
        config.board_size(),
        &base_url,
        query.image_size.unwrap_or(PIXEL_SIZE),
        query.redirect.as_deref().filter(|r| !r.is_empty()),
    )?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, ONE_DAY),
        ],
        body,
    )
        .into_response())
}

/// GET / - interactive page.
async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let config = state.board.config();
    Ok(Html(
        state
            .renderer
            .index(config.palette(), config.board_size())?,
    ))
}

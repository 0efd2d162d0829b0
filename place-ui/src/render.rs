//! SVG, HTML and README-snippet rendering.
//!
//! Templates are compiled into the binary and rendered with minijinja.

use minijinja::{Environment, context};
use place::core::coord::all_coordinates;
use place::core::palette::{Color, Palette};
use serde::Serialize;

const SWATCH_TEMPLATE: &str = include_str!("templates/swatch.svg");
const RAW_TEMPLATE: &str = include_str!("templates/raw.md");
const INDEX_TEMPLATE: &str = include_str!("templates/index.html");

/// Edge length of every rendered swatch and pixel, in pixels.
pub const PIXEL_SIZE: u32 = 40;

#[derive(Debug, Serialize)]
struct SwatchContext<'a> {
    value: &'a str,
    hex: &'a str,
}

impl<'a> From<&'a Color> for SwatchContext<'a> {
    fn from(color: &'a Color) -> Self {
        Self {
            value: color.as_str(),
            hex: color.hex(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CellContext {
    x: u32,
    y: u32,
}

/// Template engine wrapper around minijinja.
pub struct Renderer {
    env: Environment<'static>,
}

impl Renderer {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template("swatch.svg", SWATCH_TEMPLATE)?;
        env.add_template("raw.md", RAW_TEMPLATE)?;
        env.add_template("index.html", INDEX_TEMPLATE)?;
        Ok(Self { env })
    }

    /// A solid square of `color`.
    pub fn swatch(&self, color: &Color) -> Result<String, minijinja::Error> {
        self.env.get_template("swatch.svg")?.render(context! {
            size => PIXEL_SIZE,
            color => color.as_str(),
        })
    }

    /// Markdown/HTML snippet for embedding the board in a README: palette
    /// links, the selected swatch and a clickable grid, all pointing at
    /// `base_url`.
    pub fn raw(
        &self,
        palette: &Palette,
        board_size: u32,
        base_url: &str,
        image_size: u32,
        redirect: Option<&str>,
    ) -> Result<String, minijinja::Error> {
        self.env.get_template("raw.md")?.render(context! {
            palette => swatches(palette),
            rows => grid(board_size),
            base_url => base_url.trim_end_matches('/'),
            swatch_size => PIXEL_SIZE,
            image_size => image_size,
            redirect => redirect,
        })
    }

    pub fn index(&self, palette: &Palette, board_size: u32) -> Result<String, minijinja::Error> {
        self.env.get_template("index.html")?.render(context! {
            palette => swatches(palette),
            rows => grid(board_size),
            swatch_size => PIXEL_SIZE,
        })
    }
}

fn swatches(palette: &Palette) -> Vec<SwatchContext<'_>> {
    palette.colors().iter().map(SwatchContext::from).collect()
}

fn grid(board_size: u32) -> Vec<Vec<CellContext>> {
    let mut rows: Vec<Vec<CellContext>> = (0..board_size).map(|_| Vec::new()).collect();
    for coord in all_coordinates(board_size) {
        rows[coord.y() as usize].push(CellContext {
            x: coord.x(),
            y: coord.y(),
        });
    }
    rows
}

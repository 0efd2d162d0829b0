//! Fixed color palette.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::validation::ValidationError;

/// Colors shipped with the board when no palette is configured.
pub const DEFAULT_PALETTE: [&str; 8] = [
    "#2b283b", // dark slate
    "#8a5a44", // saddle brown
    "#c74b50", // brick red
    "#f9d56e", // mellow yellow
    "#5b8c5a", // forest green
    "#4a69bd", // classic blue
    "#7d5ba6", // muted purple
    "#faf3e0", // cream white
];

static HEX_COLOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(?:[0-9a-f]{3}|[0-9a-f]{6}|[0-9a-f]{8})$").expect("hex color regex")
});

/// A palette member, stored in its lowercase spelling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hex digits without the leading `#`, as used in query strings.
    pub fn hex(&self) -> &str {
        self.0.trim_start_matches('#')
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered, non-empty set of distinct allowed colors.
///
/// Membership checks are case-insensitive. The first color is the default for
/// seeding and for pixels that have no stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Color>,
}

impl Palette {
    /// Build a palette, normalizing to lowercase.
    ///
    /// Returns a description of every problem found, so a bad config file is
    /// fixed in one pass.
    pub fn new<S: AsRef<str>>(colors: &[S]) -> Result<Self, Vec<String>> {
        let mut errors = Vec::new();
        let mut normalized: Vec<Color> = Vec::with_capacity(colors.len());

        if colors.is_empty() {
            errors.push("palette must contain at least one color".to_string());
        }

        for raw in colors {
            let lower = raw.as_ref().trim().to_lowercase();
            if !HEX_COLOR_RE.is_match(&lower) {
                errors.push(format!("palette color '{}' is not a hex color", raw.as_ref()));
                continue;
            }
            if normalized.iter().any(|c| c.0 == lower) {
                errors.push(format!("palette color '{}' is listed twice", raw.as_ref()));
                continue;
            }
            normalized.push(Color(lower));
        }

        if errors.is_empty() {
            Ok(Self { colors: normalized })
        } else {
            Err(errors)
        }
    }

    pub fn default_color(&self) -> &Color {
        &self.colors[0]
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Look up `candidate` case-insensitively.
    pub fn find(&self, candidate: &str) -> Option<&Color> {
        let lower = candidate.to_lowercase();
        self.colors.iter().find(|c| c.0 == lower)
    }

    /// Validate `candidate` and return the palette's own spelling of it.
    pub fn parse(&self, candidate: &str) -> Result<Color, ValidationError> {
        self.find(candidate)
            .cloned()
            .ok_or_else(|| ValidationError::InvalidColor {
                color: candidate.to_string(),
                allowed: self.colors.iter().map(|c| c.0.clone()).collect(),
            })
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: DEFAULT_PALETTE
                .iter()
                .map(|c| Color((*c).to_string()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_every_member_in_any_case() {
        let palette = Palette::default();
        for color in DEFAULT_PALETTE {
            assert_eq!(palette.parse(color).expect("lower").as_str(), color);
            let upper = color.to_uppercase();
            assert_eq!(palette.parse(&upper).expect("upper").as_str(), color);
        }
    }

    #[test]
    fn rejects_non_members() {
        let palette = Palette::default();
        for candidate in ["not-a-color", "", "#000000", "2b283b", "#2b283b "] {
            let err = palette.parse(candidate).expect_err(candidate);
            assert!(matches!(err, ValidationError::InvalidColor { .. }));
        }
    }

    #[test]
    fn invalid_color_message_lists_palette() {
        let palette = Palette::new(&["#fff", "#000"]).expect("palette");
        let err = palette.parse("#123").expect_err("reject");
        assert_eq!(
            err.to_string(),
            "invalid color: #123. Must be one of: #fff, #000"
        );
    }

    #[test]
    fn new_normalizes_to_lowercase() {
        let palette = Palette::new(&["#ABCDEF", "#12345678"]).expect("palette");
        assert_eq!(palette.default_color().as_str(), "#abcdef");
        assert_eq!(palette.colors()[1].hex(), "12345678");
    }

    #[test]
    fn new_reports_every_problem() {
        let errors = Palette::new(&["#fff", "#FFF", "red", "#12"]).expect_err("invalid");
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.contains("listed twice")));
        assert!(errors.iter().any(|e| e.contains("'red'")));
        assert!(errors.iter().any(|e| e.contains("'#12'")));
    }

    #[test]
    fn new_rejects_empty() {
        let errors = Palette::new::<&str>(&[]).expect_err("empty");
        assert_eq!(errors, vec!["palette must contain at least one color"]);
    }
}

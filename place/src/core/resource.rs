//! Identifiers of externally cached renderings that a mutation makes stale.

use super::coord::Coordinate;

/// Which cached renderings to purge for each kind of mutation.
///
/// Single-resource identifiers are built from `base_url` and the rendering
/// routes; `on_paint` / `on_select` list composite resources (pages or proxies
/// embedding the board) that are purged alongside them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvalidationTargets {
    pub base_url: String,
    pub on_paint: Vec<String>,
    pub on_select: Vec<String>,
}

impl InvalidationTargets {
    pub fn pixel_resource(&self, coord: Coordinate) -> String {
        format!(
            "{}/pixel?x={}&y={}",
            self.base(),
            coord.x(),
            coord.y()
        )
    }

    pub fn selected_resource(&self) -> String {
        format!("{}/selected", self.base())
    }

    /// Resources made stale by painting `coord`.
    pub fn for_paint(&self, coord: Coordinate) -> Vec<String> {
        let mut resources = vec![self.pixel_resource(coord)];
        resources.extend(self.on_paint.iter().cloned());
        resources
    }

    /// Resources made stale by changing the selected color.
    pub fn for_select(&self) -> Vec<String> {
        let mut resources = vec![self.selected_resource()];
        resources.extend(self.on_select.iter().cloned());
        resources
    }

    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paint_targets_pixel_then_composites() {
        let targets = InvalidationTargets {
            base_url: "https://place.example/".to_string(),
            on_paint: vec!["owner/readme".to_string()],
            on_select: Vec::new(),
        };
        let coord = Coordinate::new(2, 1, 4).expect("coord");
        assert_eq!(
            targets.for_paint(coord),
            vec![
                "https://place.example/pixel?x=2&y=1".to_string(),
                "owner/readme".to_string(),
            ]
        );
    }

    #[test]
    fn select_targets_are_root_relative_without_base_url() {
        let targets = InvalidationTargets {
            on_select: vec!["owner/readme".to_string()],
            ..InvalidationTargets::default()
        };
        assert_eq!(
            targets.for_select(),
            vec!["/selected".to_string(), "owner/readme".to_string()]
        );
    }
}

//! # Label Stock
//!
//! A [`Label`] describes a physical print medium: its size in millimeters
//! and the pixel grid it occupies at each supported DPI. Labels are
//! immutable reference data, looked up by id in a [`LabelCatalog`].
//!
//! ## Built-in Stock
//!
//! | Id | Size | 203 DPI | 300 DPI |
//! |----|------|---------|---------|
//! | `2x1` | 50.8 × 25.4 mm | 406 × 203 | 600 × 300 |
//! | `2.25x1.25` | 57.15 × 31.75 mm | 457 × 254 | 675 × 375 |
//! | `4x3` | 101.6 × 76.2 mm | 812 × 609 | 1200 × 900 |
//! | `4x6` | 101.6 × 152.4 mm | 812 × 1218 | 1200 × 1800 |
//! | `57x32` | 57 × 32 mm | 456 × 256 | 673 × 378 |
//! | `62x29` | 62 × 29 mm | 496 × 232 | 732 × 343 |
//! | `100x50` | 100 × 50 mm | 799 × 400 | 1181 × 591 |

use serde::{Deserialize, Serialize};

use crate::units::{self, Dpi};

/// Pixel dimensions of a label at one DPI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A print medium descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    pub name: String,
    pub width_mm: f32,
    pub height_mm: f32,
    /// Precomputed surface size at 203 DPI.
    pub px_203: PixelSize,
    /// Precomputed surface size at 300 DPI.
    pub px_300: PixelSize,
}

impl Label {
    /// Build a label from its physical size, computing both pixel grids.
    pub fn from_mm(id: impl Into<String>, name: impl Into<String>, width_mm: f32, height_mm: f32) -> Self {
        let grid = |dpi| {
            PixelSize::new(
                units::mm_to_surface_pixels(width_mm, dpi),
                units::mm_to_surface_pixels(height_mm, dpi),
            )
        };
        Self {
            id: id.into(),
            name: name.into(),
            width_mm,
            height_mm,
            px_203: grid(Dpi::Dpi203),
            px_300: grid(Dpi::Dpi300),
        }
    }

    /// Build a label from a size in inches.
    pub fn from_inches(id: impl Into<String>, name: impl Into<String>, width_in: f32, height_in: f32) -> Self {
        Self::from_mm(id, name, width_in * units::MM_PER_INCH, height_in * units::MM_PER_INCH)
    }

    /// Stored surface size at `dpi`.
    pub fn pixels(&self, dpi: Dpi) -> PixelSize {
        match dpi {
            Dpi::Dpi203 => self.px_203,
            Dpi::Dpi300 => self.px_300,
        }
    }

    /// Whether the stored pixel grids agree with the physical size to within
    /// one pixel at both resolutions.
    pub fn is_consistent(&self) -> bool {
        Dpi::ALL.iter().all(|&dpi| {
            let stored = self.pixels(dpi);
            let w = units::mm_to_pixels(self.width_mm, dpi);
            let h = units::mm_to_pixels(self.height_mm, dpi);
            (stored.width as f32 - w).abs() <= 1.0 && (stored.height as f32 - h).abs() <= 1.0
        })
    }
}

/// Lookup table of known labels.
#[derive(Debug, Clone, Default)]
pub struct LabelCatalog {
    labels: Vec<Label>,
}

impl LabelCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog preloaded with common thermal label stock.
    pub fn built_in() -> Self {
        Self {
            labels: vec![
                Label::from_inches("2x1", "2\" × 1\"", 2.0, 1.0),
                Label::from_inches("2.25x1.25", "2.25\" × 1.25\"", 2.25, 1.25),
                Label::from_inches("4x3", "4\" × 3\"", 4.0, 3.0),
                Label::from_inches("4x6", "4\" × 6\" shipping", 4.0, 6.0),
                Label::from_mm("57x32", "57 × 32 mm", 57.0, 32.0),
                Label::from_mm("62x29", "62 × 29 mm address", 62.0, 29.0),
                Label::from_mm("100x50", "100 × 50 mm", 100.0, 50.0),
            ],
        }
    }

    /// Add or replace a label (matched by id).
    pub fn insert(&mut self, label: Label) {
        match self.labels.iter_mut().find(|l| l.id == label.id) {
            Some(existing) => *existing = label,
            None => self.labels.push(label),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Label> {
        self.labels.iter().find(|l| l.id == id)
    }

    pub fn all(&self) -> &[Label] {
        &self.labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_by_one_dimensions() {
        let label = Label::from_inches("2x1", "2x1", 2.0, 1.0);
        assert!((label.width_mm - 50.8).abs() < 1e-3);
        assert_eq!(label.pixels(Dpi::Dpi203), PixelSize::new(406, 203));
        assert_eq!(label.pixels(Dpi::Dpi300), PixelSize::new(600, 300));
    }

    #[test]
    fn test_built_in_labels_are_consistent() {
        let catalog = LabelCatalog::built_in();
        assert!(!catalog.all().is_empty());
        for label in catalog.all() {
            assert!(label.is_consistent(), "{} is inconsistent", label.id);
        }
    }

    #[test]
    fn test_inconsistent_stored_pixels_detected() {
        let mut label = Label::from_mm("x", "x", 50.0, 30.0);
        label.px_300 = PixelSize::new(10, 10);
        assert!(!label.is_consistent());
    }

    #[test]
    fn test_catalog_lookup_and_replace() {
        let mut catalog = LabelCatalog::built_in();
        assert!(catalog.get("4x6").is_some());
        assert!(catalog.get("nope").is_none());

        let before = catalog.all().len();
        catalog.insert(Label::from_mm("4x6", "replaced", 10.0, 10.0));
        assert_eq!(catalog.all().len(), before);
        assert_eq!(catalog.get("4x6").unwrap().name, "replaced");

        catalog.insert(Label::from_mm("custom", "Custom", 30.0, 20.0));
        assert_eq!(catalog.all().len(), before + 1);
    }

    #[test]
    fn test_label_json_round_trip() {
        let json = r#"{
            "id": "2x1", "name": "2x1", "width_mm": 50.8, "height_mm": 25.4,
            "px_203": {"width": 406, "height": 203},
            "px_300": {"width": 600, "height": 300}
        }"#;
        let label: Label = serde_json::from_str(json).unwrap();
        assert_eq!(label.pixels(Dpi::Dpi300).width, 600);
        assert!(label.is_consistent());
    }
}

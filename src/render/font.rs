//! Bitmap text rasterization.
//!
//! Glyphs come from the embedded Spleen PSF2 fonts. The face closest to the
//! requested size is picked and scaled nearest-neighbour so that one em is
//! `font_size` pixels tall. Font family is not consulted: every family maps
//! onto the same bitmap faces.

use spleen_font::{FONT_6X12, FONT_8X16, FONT_12X24, PSF2Font};

use crate::surface::Mask;

/// One embedded bitmap face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    data: &'static [u8],
    pub cell_width: usize,
    pub cell_height: usize,
}

const SMALL: Face = Face {
    data: FONT_6X12,
    cell_width: 6,
    cell_height: 12,
};

const MEDIUM: Face = Face {
    data: FONT_8X16,
    cell_width: 8,
    cell_height: 16,
};

const LARGE: Face = Face {
    data: FONT_12X24,
    cell_width: 12,
    cell_height: 24,
};

impl Face {
    /// The face used for a given pixel size.
    pub fn for_size(font_size: f32) -> Face {
        if font_size <= 13.0 {
            SMALL
        } else if font_size <= 19.0 {
            MEDIUM
        } else {
            LARGE
        }
    }

    /// Horizontal advance per character at `font_size`.
    pub fn advance(&self, font_size: f32) -> f32 {
        self.cell_width as f32 * font_size / self.cell_height as f32
    }

    /// A hollow box, drawn for characters the face lacks.
    fn missing_glyph(&self) -> Vec<bool> {
        let (w, h) = (self.cell_width, self.cell_height);
        let mut bitmap = vec![false; w * h];
        for x in 1..w - 1 {
            bitmap[2 * w + x] = true;
            bitmap[(h - 3) * w + x] = true;
        }
        for y in 2..h - 2 {
            bitmap[y * w + 1] = true;
            bitmap[y * w + w - 2] = true;
        }
        bitmap
    }
}

/// Width in pixels of `line` at `font_size`.
pub fn measure(line: &str, font_size: f32) -> f32 {
    if font_size <= 0.0 {
        return 0.0;
    }
    Face::for_size(font_size).advance(font_size) * line.chars().count() as f32
}

/// Pixel rectangle `[x0, x1) x [y0, y1)` in line-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl Window {
    pub fn width(&self) -> usize {
        self.x1.saturating_sub(self.x0)
    }

    pub fn height(&self) -> usize {
        self.y1.saturating_sub(self.y0)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// Full pixel size `(width, height)` of `line` rasterized at `font_size`,
/// including the bold strike.
pub fn line_extent(line: &str, font_size: f32, bold: bool) -> (usize, usize) {
    let char_count = line.chars().count();
    if font_size <= 0.0 || char_count == 0 {
        return (0, 0);
    }
    let width = (measure(line, font_size)).ceil() as usize;
    (width.saturating_add(usize::from(bold)), font_size.ceil() as usize)
}

/// Rasterize the part of one line that falls inside `window`.
///
/// Mask pixel `(0, 0)` is line pixel `(window.x0, window.y0)`; the mask is
/// never larger than the window. Bold adds a one-pixel double strike to the
/// right.
pub fn rasterize_window(line: &str, font_size: f32, bold: bool, window: Window) -> Mask {
    let (full_w, full_h) = line_extent(line, font_size, bold);
    let window = Window {
        x0: window.x0,
        y0: window.y0,
        x1: window.x1.min(full_w),
        y1: window.y1.min(full_h),
    };
    if window.is_empty() {
        return Mask::new(0, 0);
    }
    let face = Face::for_size(font_size);
    let scale = font_size / face.cell_height as f32;
    let advance = face.advance(font_size);
    let extra = usize::from(bold);
    let mut mask = Mask::new(window.width(), window.height());

    let mut font = PSF2Font::new(face.data).ok();
    for (i, ch) in line.chars().enumerate() {
        if ch == ' ' {
            continue;
        }
        let x0 = (i as f32 * advance).floor() as usize;
        let x1 = ((i + 1) as f32 * advance).floor() as usize;
        let x1 = x1.max(x0 + 1);
        // Columns of this glyph (plus its bold strike) that reach the window.
        let from = x0.max(window.x0.saturating_sub(extra));
        let to = x1.min(window.x1);
        if from >= to {
            continue;
        }

        let utf8 = ch.to_string();
        let bitmap = match font.as_mut().and_then(|f| f.glyph_for_utf8(utf8.as_bytes())) {
            Some(rows) => {
                let mut bitmap = vec![false; face.cell_width * face.cell_height];
                for (row_y, row) in rows.enumerate() {
                    for (col_x, on) in row.enumerate() {
                        if row_y < face.cell_height && col_x < face.cell_width {
                            bitmap[row_y * face.cell_width + col_x] = on;
                        }
                    }
                }
                bitmap
            }
            None => face.missing_glyph(),
        };
        for dy in window.y0..window.y1 {
            let sy = ((dy as f32 / scale) as usize).min(face.cell_height - 1);
            for dx in from..to {
                let sx = (((dx - x0) as f32 / scale) as usize).min(face.cell_width - 1);
                if bitmap[sy * face.cell_width + sx] {
                    for px in dx..=dx + extra {
                        if px >= window.x0 {
                            mask.set(px - window.x0, dy - window.y0, 1.0);
                        }
                    }
                }
            }
        }
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rasterize_line(line: &str, font_size: f32, bold: bool) -> Mask {
        let (x1, y1) = line_extent(line, font_size, bold);
        rasterize_window(line, font_size, bold, Window { x0: 0, y0: 0, x1, y1 })
    }

    #[test]
    fn test_face_selection() {
        assert_eq!(Face::for_size(10.0).cell_height, 12);
        assert_eq!(Face::for_size(16.0).cell_height, 16);
        assert_eq!(Face::for_size(48.0).cell_height, 24);
    }

    #[test]
    fn test_measure_scales_with_size() {
        assert_eq!(measure("abcd", 16.0), 32.0);
        assert_eq!(measure("abcd", 48.0), 96.0);
        assert_eq!(measure("", 16.0), 0.0);
    }

    #[test]
    fn test_rasterize_has_ink() {
        let mask = rasterize_line("Hi", 24.0, false);
        assert_eq!(mask.height, 24);
        assert_eq!(mask.width, 24);
        assert!(!mask.is_blank());
    }

    #[test]
    fn test_bold_adds_coverage() {
        let regular = rasterize_line("l", 16.0, false);
        let bold = rasterize_line("l", 16.0, true);
        let ink = |m: &Mask| m.data.iter().filter(|&&c| c > 0.0).count();
        assert!(ink(&bold) > ink(&regular));
    }

    #[test]
    fn test_unknown_glyph_draws_box() {
        let mask = rasterize_line("漢", 24.0, false);
        assert!(!mask.is_blank());
    }

    #[test]
    fn test_spaces_are_blank() {
        assert!(rasterize_line("   ", 16.0, false).is_blank());
    }

    #[test]
    fn test_window_is_a_crop_of_the_full_line() {
        let full = rasterize_line("Hi", 24.0, true);
        let window = Window { x0: 5, y0: 3, x1: 17, y1: 20 };
        let part = rasterize_window("Hi", 24.0, true, window);
        assert_eq!((part.width, part.height), (12, 17));
        for y in 0..part.height {
            for x in 0..part.width {
                assert_eq!(part.get(x, y), full.get(x + 5, y + 3), "pixel ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_huge_size_allocates_only_the_window() {
        let window = Window { x0: 0, y0: 0, x1: 600, y1: 300 };
        let mask = rasterize_window("AAAAAAAAAA", 200_000.0, false, window);
        assert_eq!((mask.width, mask.height), (600, 300));
        assert_eq!(line_extent("AAAAAAAAAA", 200_000.0, false), (1_000_000, 200_000));
    }
}

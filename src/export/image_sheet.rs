//! PNG swatch sheet
//!
//! Each color gets a square swatch with a footer strip below it; the strip
//! is filled from the left in proportion to the color's weight.

use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::constants::export::{GRID_COLUMNS, SWATCH_SIZE};
use crate::error::{PaletteError, Result};
use crate::matcher::Match;

const FOOTER_HEIGHT: u32 = 20;
const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const WEIGHT_BAR: Rgb<u8> = Rgb([64, 64, 64]);

/// Arrangement of swatches on the sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwatchLayout {
    /// One row
    #[default]
    Horizontal,
    /// Up to four columns, as many rows as needed
    Grid,
}

/// Render the palette as a PNG image
///
/// # Errors
///
/// Returns `ExportError` for an empty palette or if encoding fails.
pub fn swatch_sheet(matches: &[Match], layout: SwatchLayout) -> Result<Vec<u8>> {
    if matches.is_empty() {
        return Err(PaletteError::ExportError {
            message: "cannot draw a swatch sheet without colors".to_string(),
        });
    }

    let columns = match layout {
        SwatchLayout::Horizontal => matches.len(),
        SwatchLayout::Grid => matches.len().min(GRID_COLUMNS),
    };
    let rows = matches.len().div_ceil(columns);
    let cell_height = SWATCH_SIZE + FOOTER_HEIGHT;

    let mut sheet = RgbImage::from_pixel(
        columns as u32 * SWATCH_SIZE,
        rows as u32 * cell_height,
        BACKGROUND,
    );

    for (i, m) in matches.iter().enumerate() {
        let x0 = (i % columns) as u32 * SWATCH_SIZE;
        let y0 = (i / columns) as u32 * cell_height;
        let swatch = Rgb(m.entry.color.to_array());
        let bar_width = (m.entry.weight.clamp(0.0, 1.0) * SWATCH_SIZE as f32).round() as u32;

        for dy in 0..cell_height {
            for dx in 0..SWATCH_SIZE {
                let pixel = if dy < SWATCH_SIZE {
                    swatch
                } else if dx < bar_width && dy >= SWATCH_SIZE + FOOTER_HEIGHT / 4 {
                    WEIGHT_BAR
                } else {
                    continue;
                };
                sheet.put_pixel(x0 + dx, y0 + dy, pixel);
            }
        }
    }

    let mut bytes = Vec::new();
    sheet
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| PaletteError::ExportError {
            message: format!("PNG encoding failed: {}", e),
        })?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::test_support::sample_matches;

    fn decode(bytes: &[u8]) -> RgbImage {
        image::load_from_memory(bytes).unwrap().to_rgb8()
    }

    #[test]
    fn test_horizontal_sheet() {
        let bytes = swatch_sheet(&sample_matches(), SwatchLayout::Horizontal).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");

        let img = decode(&bytes);
        assert_eq!(img.dimensions(), (2 * SWATCH_SIZE, SWATCH_SIZE + FOOTER_HEIGHT));
        assert_eq!(img.get_pixel(10, 10), &Rgb([255, 0, 0]));
        assert_eq!(img.get_pixel(SWATCH_SIZE + 10, 10), &Rgb([0, 128, 255]));
        // Weight 0.6 fills 60 px of the first footer
        assert_eq!(img.get_pixel(59, SWATCH_SIZE + FOOTER_HEIGHT - 1), &WEIGHT_BAR);
        assert_eq!(img.get_pixel(60, SWATCH_SIZE + FOOTER_HEIGHT - 1), &BACKGROUND);
    }

    #[test]
    fn test_grid_sheet() {
        let mut matches = sample_matches();
        for _ in 0..2 {
            matches.extend(sample_matches());
        }
        let img = decode(&swatch_sheet(&matches, SwatchLayout::Grid).unwrap());
        // Six colors in four columns -> two rows
        assert_eq!(img.dimensions(), (4 * SWATCH_SIZE, 2 * (SWATCH_SIZE + FOOTER_HEIGHT)));
        assert_eq!(img.get_pixel(10, SWATCH_SIZE + FOOTER_HEIGHT + 10), &Rgb([255, 0, 0]));
    }

    #[test]
    fn test_empty_sheet_rejected() {
        assert!(matches!(
            swatch_sheet(&[], SwatchLayout::Grid),
            Err(PaletteError::ExportError { .. })
        ));
    }
}

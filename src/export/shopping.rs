//! Pencil shopping list
//!
//! Collapses matches to unique pencils (brand + code), keeping the closest
//! distance seen for each, ordered closest first.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::catalog::PencilColor;
use crate::constants::export::SHOPPING_LIST_PER_BRAND;
use crate::error::{PaletteError, Result};
use crate::matcher::{Match, MatchQuality};

use super::text::csv_field;

/// Output flavor of the shopping list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShoppingListFormat {
    #[default]
    Text,
    Csv,
    Json,
}

#[derive(Serialize)]
struct ShoppingItem<'a> {
    brand: &'a str,
    line: &'a str,
    code: &'a str,
    name: &'a str,
    hex: String,
    color_difference: f32,
    match_quality: &'static str,
}

#[derive(Serialize)]
struct ShoppingList<'a> {
    shopping_list: Vec<ShoppingItem<'a>>,
    total_pencils: usize,
    brands: Vec<&'a str>,
}

/// Unique pencils with their best distance, closest first
fn unique_pencils(matches: &[Match]) -> Vec<(&PencilColor, f32)> {
    let mut unique: Vec<(&PencilColor, f32)> = Vec::new();
    for m in matches {
        let existing = unique
            .iter_mut()
            .find(|(p, _)| p.brand == m.pencil.brand && p.code == m.pencil.code);
        match existing {
            Some(slot) if m.distance < slot.1 => slot.1 = m.distance,
            Some(_) => {}
            None => unique.push((&m.pencil, m.distance)),
        }
    }
    // Stable: equal distances keep first-seen order
    unique.sort_by(|a, b| a.1.total_cmp(&b.1));
    unique
}

/// Brands in order of their closest pencil
fn brands_in_order<'a>(pencils: &[(&'a PencilColor, f32)]) -> Vec<&'a str> {
    let mut brands: Vec<&str> = Vec::new();
    for &(pencil, _) in pencils {
        if !brands.contains(&pencil.brand.as_str()) {
            brands.push(pencil.brand.as_str());
        }
    }
    brands
}

fn quality_label(distance: f32) -> &'static str {
    MatchQuality::from_distance(distance).label()
}

/// Render the pencils needed for a palette
pub fn shopping_list(matches: &[Match], format: ShoppingListFormat) -> Result<String> {
    let pencils = unique_pencils(matches);
    let brands = brands_in_order(&pencils);

    match format {
        ShoppingListFormat::Text => {
            let mut out = String::from("COLORED PENCIL SHOPPING LIST\n");
            out.push_str(&"=".repeat(40));
            out.push_str("\n\n");
            for brand in &brands {
                let heading = format!("{} PENCILS:", brand.to_uppercase());
                let _ = writeln!(out, "{}", heading);
                let _ = writeln!(out, "{}", "-".repeat(heading.chars().count()));
                for (pencil, distance) in pencils
                    .iter()
                    .filter(|(p, _)| p.brand == *brand)
                    .take(SHOPPING_LIST_PER_BRAND)
                {
                    let _ = writeln!(
                        out,
                        "• {} ({}) - Match Quality: {}",
                        pencil.name,
                        pencil.code,
                        quality_label(*distance)
                    );
                }
                out.push('\n');
            }
            Ok(out)
        }
        ShoppingListFormat::Csv => {
            let mut out = String::from("brand,line,code,name,color_difference,match_quality\n");
            for (pencil, distance) in &pencils {
                let _ = writeln!(
                    out,
                    "{},{},{},{},{:.2},{}",
                    csv_field(&pencil.brand),
                    csv_field(&pencil.line),
                    csv_field(&pencil.code),
                    csv_field(&pencil.name),
                    distance,
                    quality_label(*distance)
                );
            }
            Ok(out)
        }
        ShoppingListFormat::Json => {
            let list = ShoppingList {
                shopping_list: pencils
                    .iter()
                    .map(|(pencil, distance)| ShoppingItem {
                        brand: &pencil.brand,
                        line: &pencil.line,
                        code: &pencil.code,
                        name: &pencil.name,
                        hex: pencil.rgb.hex(),
                        color_difference: *distance,
                        match_quality: quality_label(*distance),
                    })
                    .collect(),
                total_pencils: pencils.len(),
                brands,
            };
            serde_json::to_string_pretty(&list).map_err(|e| PaletteError::ExportError {
                message: format!("shopping list serialization failed: {}", e),
            })
        }
    }
}

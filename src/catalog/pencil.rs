//! Pencil records and the on-disk catalog layout

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::color::Color;

/// One colored pencil product
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PencilColor {
    pub brand: String,
    /// Product line, e.g. "Polychromos"
    pub line: String,
    /// Manufacturer color code
    pub code: String,
    pub name: String,
    pub rgb: Color,
}

impl PencilColor {
    pub fn new(
        brand: impl Into<String>,
        line: impl Into<String>,
        code: impl Into<String>,
        name: impl Into<String>,
        rgb: Color,
    ) -> Self {
        Self {
            brand: brand.into(),
            line: line.into(),
            code: code.into(),
            name: name.into(),
            rgb,
        }
    }

    /// "Brand Name", as shown on shopping lists and swatch labels
    pub fn display_name(&self) -> String {
        format!("{} {}", self.brand, self.name)
    }
}

impl fmt::Display for PencilColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} ({})", self.brand, self.code, self.name, self.rgb.hex())
    }
}

/// Catalog file entry: one brand line with its pencils
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct BrandLine {
    pub brand: String,
    pub line: String,
    pub pencils: Vec<PencilRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct PencilRecord {
    pub code: String,
    pub name: String,
    pub rgb: [u8; 3],
}

pub(crate) fn flatten(lines: Vec<BrandLine>) -> Vec<PencilColor> {
    lines
        .into_iter()
        .flat_map(|line| {
            let BrandLine { brand, line, pencils } = line;
            pencils.into_iter().map(move |p| {
                PencilColor::new(brand.clone(), line.clone(), p.code, p.name, Color::from(p.rgb))
            })
        })
        .collect()
}

//! Colored pencil catalog with perceptual nearest-color lookup
//!
//! The catalog is an immutable table of [`PencilColor`]s. Lab values are
//! computed once at load, and every query is a linear scan using ΔE76
//! (Euclidean distance in CIE Lab, D65). Ties go to the pencil listed first.
//!
//! The bundled catalog covers six brands and is parsed on first use:
//!
//! ```
//! use pencil_palette::{Color, PencilCatalog};
//!
//! let catalog = PencilCatalog::builtin()?;
//! let (pencil, distance) = catalog.nearest_to(Color::new(230, 30, 40));
//! println!("{} ({:.1})", pencil, distance);
//! # Ok::<(), pencil_palette::PaletteError>(())
//! ```

mod pencil;

use std::path::Path;
use std::sync::OnceLock;

use log::debug;
use palette::Lab;

use crate::color::{delta_e, Color};
use crate::error::{PaletteError, Result};

pub use pencil::PencilColor;

const BUILTIN_CATALOG: &str = include_str!("../../data/pencils.json");

/// Read-only pencil table, shared by reference across requests
#[derive(Debug, Clone)]
pub struct PencilCatalog {
    pencils: Vec<PencilColor>,
    labs: Vec<Lab>,
    brands: Vec<String>,
}

impl PencilCatalog {
    /// Build a catalog from pencils in listing order
    ///
    /// # Errors
    ///
    /// Returns `EmptyCatalog` if `pencils` is empty.
    pub fn new(pencils: Vec<PencilColor>) -> Result<Self> {
        if pencils.is_empty() {
            return Err(PaletteError::EmptyCatalog {
                reason: "catalog contains no pencils".to_string(),
            });
        }

        let labs = pencils.iter().map(|p| p.rgb.to_lab()).collect();
        let mut brands: Vec<String> = Vec::new();
        for pencil in &pencils {
            if !brands.iter().any(|b| b.eq_ignore_ascii_case(&pencil.brand)) {
                brands.push(pencil.brand.clone());
            }
        }

        Ok(Self {
            pencils,
            labs,
            brands,
        })
    }

    /// Parse a catalog from its JSON form:
    /// `[{"brand", "line", "pencils": [{"code", "name", "rgb": [r, g, b]}]}]`
    pub fn from_json_str(json: &str) -> Result<Self> {
        let lines: Vec<pencil::BrandLine> = serde_json::from_str(json)
            .map_err(|e| PaletteError::catalog_load("Invalid catalog JSON", e))?;
        Self::new(pencil::flatten(lines))
    }

    /// Load a catalog JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            PaletteError::catalog_load(format!("Failed to read catalog: {}", path.display()), e)
        })?;
        let catalog = Self::from_json_str(&json)?;
        debug!("loaded {} pencils from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// The bundled catalog, parsed once per process
    pub fn builtin() -> Result<&'static PencilCatalog> {
        static BUILTIN: OnceLock<std::result::Result<PencilCatalog, String>> = OnceLock::new();

        BUILTIN
            .get_or_init(|| {
                let catalog =
                    PencilCatalog::from_json_str(BUILTIN_CATALOG).map_err(|e| e.to_string())?;
                debug!(
                    "bundled catalog: {} pencils, {} brands",
                    catalog.len(),
                    catalog.brands.len()
                );
                Ok(catalog)
            })
            .as_ref()
            .map_err(|reason| PaletteError::EmptyCatalog {
                reason: reason.clone(),
            })
    }

    pub fn len(&self) -> usize {
        self.pencils.len()
    }

    /// Always false; an empty catalog cannot be constructed
    pub fn is_empty(&self) -> bool {
        self.pencils.is_empty()
    }

    pub fn pencils(&self) -> &[PencilColor] {
        &self.pencils
    }

    /// Brand names in listing order
    pub fn brands(&self) -> &[String] {
        &self.brands
    }

    /// Canonical spelling of `brand` (ASCII case-insensitive)
    pub fn resolve_brand(&self, brand: &str) -> Result<&str> {
        self.brands
            .iter()
            .find(|b| b.eq_ignore_ascii_case(brand))
            .map(String::as_str)
            .ok_or_else(|| PaletteError::UnknownBrand {
                brand: brand.to_string(),
            })
    }

    /// All pencils of one brand in listing order
    pub fn pencils_for_brand(&self, brand: &str) -> Result<Vec<&PencilColor>> {
        let brand = self.resolve_brand(brand)?;
        Ok(self
            .pencils
            .iter()
            .filter(|p| p.brand.eq_ignore_ascii_case(brand))
            .collect())
    }

    /// Closest pencil over the whole catalog, with its ΔE76 distance
    pub fn nearest_to(&self, color: Color) -> (&PencilColor, f32) {
        // Non-empty by construction
        let (idx, distance) = self
            .nearest_where(color.to_lab(), |_| true)
            .unwrap_or((0, delta_e(color.to_lab(), self.labs[0])));
        (&self.pencils[idx], distance)
    }

    /// Closest pencil of one brand
    pub fn nearest_to_within_brand(&self, color: Color, brand: &str) -> Result<(&PencilColor, f32)> {
        let brand = self.resolve_brand(brand)?;
        self.nearest_where(color.to_lab(), |p| p.brand.eq_ignore_ascii_case(brand))
            .map(|(idx, distance)| (&self.pencils[idx], distance))
            .ok_or_else(|| PaletteError::UnknownBrand {
                brand: brand.to_string(),
            })
    }

    /// Closest pencil among the given (already resolved) brands
    pub(crate) fn nearest_among(&self, color: Color, brands: &[&str]) -> Option<(&PencilColor, f32)> {
        self.nearest_where(color.to_lab(), |p| {
            brands.iter().any(|b| p.brand.eq_ignore_ascii_case(b))
        })
        .map(|(idx, distance)| (&self.pencils[idx], distance))
    }

    /// Up to `n` closest pencils, optionally within one brand, sorted by
    /// distance then listing order
    pub fn nearest_n(
        &self,
        color: Color,
        n: usize,
        brand: Option<&str>,
    ) -> Result<Vec<(&PencilColor, f32)>> {
        let brand = brand.map(|b| self.resolve_brand(b)).transpose()?;
        let lab = color.to_lab();

        let mut ranked: Vec<(usize, f32)> = self
            .labs
            .iter()
            .enumerate()
            .filter(|(idx, _)| brand.map_or(true, |b| self.pencils[*idx].brand.eq_ignore_ascii_case(b)))
            .map(|(idx, &pencil_lab)| (idx, delta_e(lab, pencil_lab)))
            .collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        ranked.truncate(n);

        Ok(ranked
            .into_iter()
            .map(|(idx, distance)| (&self.pencils[idx], distance))
            .collect())
    }

    /// Index and distance of the closest pencil accepted by `filter`
    fn nearest_where<F>(&self, lab: Lab, filter: F) -> Option<(usize, f32)>
    where
        F: Fn(&PencilColor) -> bool,
    {
        let mut best: Option<(usize, f32)> = None;
        for (idx, (pencil, &pencil_lab)) in self.pencils.iter().zip(&self.labs).enumerate() {
            if !filter(pencil) {
                continue;
            }
            let distance = delta_e(lab, pencil_lab);
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((idx, distance));
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_catalog() -> PencilCatalog {
        PencilCatalog::new(vec![
            PencilColor::new("Prismacolor", "Premier", "PC922", "Scarlet Red", Color::new(237, 28, 36)),
            PencilColor::new("Prismacolor", "Premier", "PC903", "True Blue", Color::new(0, 115, 207)),
            PencilColor::new("Faber-Castell", "Polychromos", "121", "Pale Geranium Lake", Color::new(237, 28, 36)),
            PencilColor::new("Faber-Castell", "Polychromos", "101", "White", Color::new(255, 255, 255)),
        ])
        .unwrap()
    }

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = PencilCatalog::builtin().unwrap();
        assert_eq!(catalog.len(), 305);
        assert_eq!(
            catalog.brands(),
            &["Prismacolor", "Faber-Castell", "Caran d'Ache", "Derwent", "Staedtler", "Koh-I-Noor"]
        );
        // Parsed once, shared afterwards
        assert!(std::ptr::eq(catalog, PencilCatalog::builtin().unwrap()));
    }

    #[test]
    fn test_empty_catalog_rejected() {
        assert!(matches!(
            PencilCatalog::new(Vec::new()),
            Err(PaletteError::EmptyCatalog { .. })
        ));
        assert!(matches!(
            PencilCatalog::from_json_str("[]"),
            Err(PaletteError::EmptyCatalog { .. })
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            PencilCatalog::from_json_str("{not json"),
            Err(PaletteError::CatalogLoadError { .. })
        ));
    }

    #[test]
    fn test_nearest_to_tie_goes_to_first_listed() {
        let catalog = small_catalog();
        let (pencil, distance) = catalog.nearest_to(Color::new(237, 28, 36));
        assert_eq!(pencil.code, "PC922");
        assert_eq!(distance, 0.0);
    }

    #[test]
    fn test_nearest_to_uses_lab_distance() {
        let catalog = small_catalog();
        let (pencil, distance) = catalog.nearest_to(Color::new(255, 0, 0));
        assert_eq!(pencil.name, "Scarlet Red");
        assert!(distance > 0.0 && distance < 25.0);
    }

    #[test]
    fn test_nearest_within_brand() {
        let catalog = small_catalog();
        let (pencil, _) = catalog
            .nearest_to_within_brand(Color::new(237, 28, 36), "faber-castell")
            .unwrap();
        assert_eq!(pencil.code, "121");

        assert!(matches!(
            catalog.nearest_to_within_brand(Color::new(0, 0, 0), "Crayola"),
            Err(PaletteError::UnknownBrand { .. })
        ));
    }

    #[test]
    fn test_nearest_n_sorted() {
        let catalog = small_catalog();
        let ranked = catalog.nearest_n(Color::new(250, 250, 250), 3, None).unwrap();
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].0.name, "White");
        assert!(ranked.windows(2).all(|w| w[0].1 <= w[1].1));

        // Equal distances keep listing order
        let reds = catalog.nearest_n(Color::new(237, 28, 36), 2, None).unwrap();
        assert_eq!(reds[0].0.code, "PC922");
        assert_eq!(reds[1].0.code, "121");

        let only_prisma = catalog
            .nearest_n(Color::new(250, 250, 250), 10, Some("PRISMACOLOR"))
            .unwrap();
        assert_eq!(only_prisma.len(), 2);
    }

    #[test]
    fn test_pencils_for_brand() {
        let catalog = small_catalog();
        assert_eq!(catalog.pencils_for_brand("Prismacolor").unwrap().len(), 2);
        assert_eq!(catalog.resolve_brand("prismacolor").unwrap(), "Prismacolor");
        assert!(catalog.pencils_for_brand("Crayola").is_err());
    }

    #[test]
    fn test_json_file_loading() {
        let dir = std::env::temp_dir().join(format!("pencil_catalog_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("catalog.json");
        std::fs::write(
            &path,
            r#"[{"brand": "Derwent", "line": "Coloursoft", "pencils": [
                {"code": "C010", "name": "Black", "rgb": [0, 0, 0]}
            ]}]"#,
        )
        .unwrap();

        let catalog = PencilCatalog::from_json_file(&path).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.pencils()[0].line, "Coloursoft");

        std::fs::remove_dir_all(&dir).unwrap();
        assert!(PencilCatalog::from_json_file(&path).is_err());
    }
}

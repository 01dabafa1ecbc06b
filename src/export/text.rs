//! Text formats: JSON, CSV, CSS and SCSS

use std::fmt::Write as _;

use serde::Serialize;

use crate::config::ExportMetadata;
use crate::error::{PaletteError, Result};
use crate::matcher::Match;

const CSV_HEADER: &str = "hex,r,g,b,pencil_brand,pencil_name,distance";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonColor<'a> {
    hex: String,
    rgb: [u8; 3],
    pencil_brand: &'a str,
    pencil_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    distance: Option<f32>,
}

pub(super) fn json(matches: &[Match], metadata: &ExportMetadata) -> Result<String> {
    let colors: Vec<JsonColor> = matches
        .iter()
        .map(|m| JsonColor {
            hex: m.entry.color.hex(),
            rgb: m.entry.color.to_array(),
            pencil_brand: &m.pencil.brand,
            pencil_name: &m.pencil.name,
            distance: metadata.include_distance_scores.then_some(m.distance),
        })
        .collect();

    serde_json::to_string_pretty(&colors).map_err(|e| PaletteError::ExportError {
        message: format!("JSON serialization failed: {}", e),
    })
}

/// Quote a CSV field when it contains a delimiter, quote or line break
pub(super) fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub(super) fn csv(matches: &[Match], metadata: &ExportMetadata) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for m in matches {
        let c = m.entry.color;
        let distance = if metadata.include_distance_scores {
            format!("{:.2}", m.distance)
        } else {
            String::new()
        };
        let _ = writeln!(
            out,
            "{},{},{},{},{},{},{}",
            c.hex(),
            c.r,
            c.g,
            c.b,
            csv_field(&m.pencil.brand),
            csv_field(&m.pencil.name),
            distance
        );
    }
    out
}

pub(super) fn css(matches: &[Match]) -> String {
    let mut out = String::from(":root {\n");
    for (i, m) in matches.iter().enumerate() {
        let _ = writeln!(out, "  --color-{}: {};", i + 1, m.entry.color.hex());
    }
    out.push_str("}\n");
    out
}

pub(super) fn scss(matches: &[Match]) -> String {
    let mut out = String::new();
    for (i, m) in matches.iter().enumerate() {
        let _ = writeln!(out, "$color-{}: {};", i + 1, m.entry.color.hex());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::test_support::sample_matches;

    #[test]
    fn test_empty_csv_is_header_only() {
        assert_eq!(csv(&[], &ExportMetadata::default()), format!("{}\n", CSV_HEADER));
    }

    #[test]
    fn test_csv_rows_and_quoting() {
        let out = csv(&sample_matches(), &ExportMetadata::default());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "#FF0000,255,0,0,Prismacolor,Scarlet Red,17.18");
        assert_eq!(lines[2], "#0080FF,0,128,255,Caran d'Ache,\"Cobalt Blue, Light\",4.50");
    }

    #[test]
    fn test_csv_without_distances() {
        let metadata = ExportMetadata {
            include_distance_scores: false,
            ..ExportMetadata::default()
        };
        let out = csv(&sample_matches(), &metadata);
        assert!(out.lines().nth(1).unwrap().ends_with("Scarlet Red,"));
    }

    #[test]
    fn test_json_roundtrip() {
        let matches = sample_matches();
        let out = json(&matches, &ExportMetadata::default()).unwrap();
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&out).unwrap();

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["hex"], "#FF0000");
        assert_eq!(parsed[0]["rgb"], serde_json::json!([255, 0, 0]));
        assert_eq!(parsed[0]["pencilBrand"], "Prismacolor");
        assert_eq!(parsed[1]["pencilName"], "Cobalt Blue, Light");
        let distance = parsed[0]["distance"].as_f64().unwrap();
        assert!((distance - 17.18).abs() < 1e-4);
    }

    #[test]
    fn test_json_without_distances() {
        let metadata = ExportMetadata {
            include_distance_scores: false,
            ..ExportMetadata::default()
        };
        let out = json(&sample_matches(), &metadata).unwrap();
        assert!(!out.contains("distance"));
    }

    #[test]
    fn test_css_and_scss() {
        let matches = sample_matches();
        assert_eq!(
            css(&matches),
            ":root {\n  --color-1: #FF0000;\n  --color-2: #0080FF;\n}\n"
        );
        assert_eq!(scss(&matches), "$color-1: #FF0000;\n$color-2: #0080FF;\n");
        assert_eq!(css(&[]), ":root {\n}\n");
    }
}

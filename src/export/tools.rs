//! Figma plugin JSON and Affinity palette XML

use std::fmt::Write as _;

use serde::Serialize;

use crate::config::ExportMetadata;
use crate::error::{PaletteError, Result};
use crate::matcher::Match;

use super::swatch_name;

#[derive(Serialize)]
struct FigmaPalette<'a> {
    version: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
    name: &'a str,
    colors: Vec<FigmaColor>,
}

#[derive(Serialize)]
struct FigmaColor {
    name: String,
    hex: String,
    rgb: FigmaRgba,
}

/// Figma paints use 0..=1 components
#[derive(Serialize)]
struct FigmaRgba {
    r: f32,
    g: f32,
    b: f32,
    a: f32,
}

pub(super) fn figma(matches: &[Match], metadata: &ExportMetadata) -> Result<String> {
    let palette = FigmaPalette {
        version: "1.0",
        kind: "color-palette",
        name: &metadata.palette_name,
        colors: matches
            .iter()
            .map(|m| {
                let [r, g, b] = m.entry.color.normalized();
                FigmaColor {
                    name: swatch_name(m, metadata.color_naming_style),
                    hex: m.entry.color.hex(),
                    rgb: FigmaRgba { r, g, b, a: 1.0 },
                }
            })
            .collect(),
    };

    serde_json::to_string_pretty(&palette).map_err(|e| PaletteError::ExportError {
        message: format!("Figma serialization failed: {}", e),
    })
}

/// Escape text for an XML attribute value
fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

pub(super) fn affinity(matches: &[Match], metadata: &ExportMetadata) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(
        out,
        "<palette name=\"{}\" version=\"2.0\">",
        xml_escape(&metadata.palette_name)
    );
    out.push_str("  <colors>\n");
    for m in matches {
        let [r, g, b] = m.entry.color.normalized();
        let name = xml_escape(&swatch_name(m, metadata.color_naming_style));
        let _ = writeln!(out, "    <color name=\"{}\" model=\"rgb\">", name);
        let _ = writeln!(out, "      <component id=\"red\" value=\"{:.6}\"/>", r);
        let _ = writeln!(out, "      <component id=\"green\" value=\"{:.6}\"/>", g);
        let _ = writeln!(out, "      <component id=\"blue\" value=\"{:.6}\"/>", b);
        out.push_str("      <component id=\"alpha\" value=\"1.000000\"/>\n");
        out.push_str("    </color>\n");
    }
    out.push_str("  </colors>\n</palette>\n");
    out
}

//! Adobe binary swatch containers
//!
//! ASE (Adobe Swatch Exchange 1.0):
//!
//! ```text
//! "ASEF" | u16 major=1 | u16 minor=0 | u32 block count
//! block: u16 type | u32 body length | body
//!   0xC001 group start: u16 name length (UTF-16 units incl. NUL) | UTF-16BE name
//!   0x0001 color entry: name as above | "RGB " | f32 r, g, b | u16 color type
//!   0xC002 group end:   empty body
//! ```
//!
//! ACO (Adobe Color swatches): a version 1 section followed by a version 2
//! section that repeats the colors with names. Every color is
//! `u16 space=0 (RGB) | u16 r, g, b (0..=65535) | u16 0`; version 2 appends
//! `u32 name length (incl. NUL) | UTF-16BE name`. All integers are big-endian.

use crate::config::ExportMetadata;
use crate::error::{PaletteError, Result};
use crate::matcher::Match;

use super::swatch_name;

const ASE_SIGNATURE: &[u8; 4] = b"ASEF";
const ASE_GROUP_START: u16 = 0xC001;
const ASE_GROUP_END: u16 = 0xC002;
const ASE_COLOR_ENTRY: u16 = 0x0001;
const ASE_GLOBAL_COLOR: u16 = 0;

const ACO_RGB_SPACE: u16 = 0;

/// NUL-terminated UTF-16BE string
fn utf16_be(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity((text.len() + 1) * 2);
    for unit in text.encode_utf16().chain(std::iter::once(0)) {
        out.extend_from_slice(&unit.to_be_bytes());
    }
    out
}

/// Name length field: UTF-16 code units including the terminator
fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count() + 1
}

fn too_large(what: &str, size: usize, limit: usize) -> PaletteError {
    PaletteError::ExportError {
        message: format!("{} is too large for a swatch file ({} > {})", what, size, limit),
    }
}

fn ase_block(out: &mut Vec<u8>, block_type: u16, body: &[u8]) -> Result<()> {
    let len = u32::try_from(body.len())
        .map_err(|_| too_large("swatch block", body.len(), u32::MAX as usize))?;
    out.extend_from_slice(&block_type.to_be_bytes());
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(body);
    Ok(())
}

/// The length field is a u16 that counts the terminator
fn ase_name(body: &mut Vec<u8>, name: &str) -> Result<()> {
    let units = utf16_len(name);
    let len = u16::try_from(units)
        .map_err(|_| too_large(&format!("swatch name \"{:.32}...\"", name), units, u16::MAX as usize))?;
    body.extend_from_slice(&len.to_be_bytes());
    body.extend_from_slice(&utf16_be(name));
    Ok(())
}

pub(super) fn ase(matches: &[Match], metadata: &ExportMetadata) -> Result<Vec<u8>> {
    let blocks = u32::try_from(matches.len() + 2)
        .map_err(|_| too_large("palette", matches.len(), u32::MAX as usize - 2))?;
    let mut out = Vec::new();
    out.extend_from_slice(ASE_SIGNATURE);
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&blocks.to_be_bytes());

    let mut group = Vec::new();
    ase_name(&mut group, &metadata.palette_name)?;
    ase_block(&mut out, ASE_GROUP_START, &group)?;

    for m in matches {
        let mut body = Vec::new();
        ase_name(&mut body, &swatch_name(m, metadata.color_naming_style))?;
        body.extend_from_slice(b"RGB ");
        for component in m.entry.color.normalized() {
            body.extend_from_slice(&component.to_be_bytes());
        }
        body.extend_from_slice(&ASE_GLOBAL_COLOR.to_be_bytes());
        ase_block(&mut out, ASE_COLOR_ENTRY, &body)?;
    }

    ase_block(&mut out, ASE_GROUP_END, &[])?;
    Ok(out)
}

fn aco_color(out: &mut Vec<u8>, m: &Match) {
    let c = m.entry.color;
    out.extend_from_slice(&ACO_RGB_SPACE.to_be_bytes());
    for channel in [c.r, c.g, c.b] {
        // 0..=255 scaled to 0..=65535
        out.extend_from_slice(&(channel as u16 * 257).to_be_bytes());
    }
    out.extend_from_slice(&0u16.to_be_bytes());
}

pub(super) fn aco(matches: &[Match], metadata: &ExportMetadata) -> Result<Vec<u8>> {
    let count = u16::try_from(matches.len())
        .map_err(|_| too_large("palette", matches.len(), u16::MAX as usize))?;
    let mut out = Vec::new();

    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&count.to_be_bytes());
    for m in matches {
        aco_color(&mut out, m);
    }

    out.extend_from_slice(&2u16.to_be_bytes());
    out.extend_from_slice(&count.to_be_bytes());
    for m in matches {
        aco_color(&mut out, m);
        let name = swatch_name(m, metadata.color_naming_style);
        let units = utf16_len(&name);
        let len = u32::try_from(units)
            .map_err(|_| too_large("swatch name", units, u32::MAX as usize))?;
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(&utf16_be(&name));
    }
    Ok(out)
}

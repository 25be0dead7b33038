// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Turning escape counts into colors.
//!
//! Every escape count is first squeezed into a single byte by
//! `to_color`.  In RGB output that byte tints the green and blue
//! channels of the pixel; in palette output it is stored as-is and
//! used as an index into a 256-entry `Palette` when the image is
//! written.  Points that never escaped always get `IN_SET`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use errors::RenderError;

/// The color byte for a point that never escaped.  Note that an
/// escape on the very last permitted iteration also maps to 255;
/// the two are indistinguishable in the output.
pub const IN_SET: u8 = 255;

/// Number of entries in a palette.
pub const PALETTE_SIZE: usize = 256;

/// Map an escape count to a color byte: `floor(255 * steps / limit)`
/// for points that escaped, `IN_SET` for points that did not.
#[inline]
pub fn to_color(steps: usize, limit: usize) -> u8 {
    if steps == 0 {
        return IN_SET;
    }
    let scaled = (steps as u128 * 255) / limit as u128;
    if scaled > 255 {
        255
    } else {
        scaled as u8
    }
}

/// The RGB layout of a color byte: no red, with the byte in both the
/// green and the blue channel.
#[inline]
pub fn tint(color: u8) -> [u8; 3] {
    [0, color, color]
}

/// A fixed table of 256 RGB colors, indexed by the bytes `to_color`
/// produces.  Loaded once before a render and never changed after.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    entries: Vec<[u8; 3]>,
}

impl Default for Palette {
    /// A blue-to-orange ramp over the escaping colors, with `IN_SET`
    /// painted black.
    fn default() -> Self {
        let mut entries: Vec<[u8; 3]> = (0..PALETTE_SIZE - 1)
            .map(|i| {
                let t = i as f64 / (PALETTE_SIZE - 2) as f64;
                let u = 1.0 - t;
                [
                    channel(9.0 * u * t * t * t),
                    channel(15.0 * u * u * t * t),
                    channel(8.5 * u * u * u * t),
                ]
            })
            .collect();
        entries.push([0, 0, 0]);
        Palette { entries }
    }
}

fn channel(v: f64) -> u8 {
    (v * 255.0).max(0.0).min(255.0) as u8
}

impl Palette {
    /// Build a palette from exactly `PALETTE_SIZE` colors.
    pub fn from_entries(entries: Vec<[u8; 3]>) -> Result<Palette, RenderError> {
        if entries.len() != PALETTE_SIZE {
            return Err(RenderError::Palette(format!(
                "expected {} colors, found {}",
                PALETTE_SIZE,
                entries.len()
            )));
        }
        Ok(Palette { entries })
    }

    /// Load a palette from a text file of 256 colors, one per line, as
    /// either `R,G,B` or `#RRGGBB`.  Blank lines and lines starting
    /// with `//` are skipped.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Palette, RenderError> {
        let path = path.as_ref();
        let describe = |e: ::std::io::Error| RenderError::Palette(format!("{}: {}", path.display(), e));
        let reader = BufReader::new(File::open(path).map_err(describe)?);
        let mut entries = Vec::with_capacity(PALETTE_SIZE);
        for (number, line) in reader.lines().enumerate() {
            let line = line.map_err(describe)?;
            let line = line.trim();
            if line.is_empty() || line.starts_with("//") {
                continue;
            }
            match parse_color(line) {
                Some(rgb) => entries.push(rgb),
                None => {
                    return Err(RenderError::Palette(format!(
                        "{}:{}: cannot parse color {:?}",
                        path.display(),
                        number + 1,
                        line
                    )))
                }
            }
        }
        Palette::from_entries(entries)
    }

    /// The color stored at `index`.
    #[inline]
    pub fn rgb(&self, index: u8) -> [u8; 3] {
        self.entries[index as usize]
    }

    /// Expand a buffer of palette indices into packed RGB triples.
    pub fn expand(&self, indices: &[u8]) -> Vec<u8> {
        let mut rgb = Vec::with_capacity(indices.len() * 3);
        for &index in indices {
            rgb.extend_from_slice(&self.rgb(index));
        }
        rgb
    }
}

fn parse_color(s: &str) -> Option<[u8; 3]> {
    if let Some(hex) = s.strip_prefix('#') {
        if hex.len() != 6 {
            return None;
        }
        let value = u32::from_str_radix(hex, 16).ok()?;
        return Some([(value >> 16) as u8, (value >> 8) as u8, value as u8]);
    }
    let parts: Vec<&str> = s.split(',').map(|p| p.trim()).collect();
    if parts.len() != 3 {
        return None;
    }
    Some([
        parts[0].parse().ok()?,
        parts[1].parse().ok()?,
        parts[2].parse().ok()?,
    ])
}

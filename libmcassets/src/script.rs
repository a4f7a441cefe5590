//! The generated `assets.js` file.
//!
//! The web viewer loads the merged assets from a single statement of the form
//! `const assetsData = JSON.parse('<json>')`. The JSON text sits inside a
//! single-quoted JavaScript literal, so backslashes and apostrophes are escaped
//! to make the literal evaluate to exactly the canonical JSON.

use regex::Regex;
use tracing::debug;

use crate::models::{AssetBundle, ModelError};

/// Name of the constant the viewer reads.
pub const ASSETS_VARIABLE: &str = "assetsData";

lazy_static! {
    static ref ASSETS_SCRIPT: Regex = Regex::new(
        r"^const ([A-Za-z_$][A-Za-z0-9_$]*) = JSON\.parse\('((?:[^'\\]|\\.)*)'\);?\s*$"
    )
    .unwrap();
}

/// Renders the assets script for `bundle`. The result has no trailing newline.
pub fn render_assets_script(bundle: &AssetBundle) -> Result<String, ModelError> {
    let json = bundle.to_canonical_json()?;
    debug!("Canonical assets JSON is {} bytes", json.len());
    Ok(format!(
        "const {} = JSON.parse('{}')",
        ASSETS_VARIABLE,
        escape_single_quoted(&json)
    ))
}

/// Recovers the bundle embedded in a script produced by
/// [`render_assets_script`].
pub fn parse_assets_script(script: &str) -> Result<AssetBundle, ModelError> {
    let captures = ASSETS_SCRIPT
        .captures(script)
        .ok_or_else(|| ModelError::MalformedScript {
            reason: "expected a single `const <name> = JSON.parse('...')` statement".to_string(),
        })?;

    let variable = &captures[1];
    if variable != ASSETS_VARIABLE {
        return Err(ModelError::MalformedScript {
            reason: format!("assigns `{}` instead of `{}`", variable, ASSETS_VARIABLE),
        });
    }

    let json = unescape_single_quoted(&captures[2])?;
    serde_json::from_str(&json).map_err(Into::into)
}

fn escape_single_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            other => out.push(other),
        }
    }
    out
}

/// Evaluates the body of a single-quoted JavaScript string literal.
fn unescape_single_quoted(literal: &str) -> Result<String, ModelError> {
    let malformed = |reason: String| ModelError::MalformedScript { reason };

    // JavaScript strings are UTF-16, so `\uXXXX` escapes may be surrogate halves
    let mut units: Vec<u16> = Vec::with_capacity(literal.len());
    let mut chars = literal.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u16; 2];
            units.extend_from_slice(c.encode_utf16(&mut buf));
            continue;
        }

        let escaped = chars
            .next()
            .ok_or_else(|| malformed("dangling backslash at end of literal".to_string()))?;
        match escaped {
            'n' => units.push(0x0a),
            'r' => units.push(0x0d),
            't' => units.push(0x09),
            'b' => units.push(0x08),
            'f' => units.push(0x0c),
            'v' => units.push(0x0b),
            '0' => units.push(0x00),
            'x' => {
                let hex: String = chars.by_ref().take(2).collect();
                units.push(parse_hex(&hex, 2).ok_or_else(|| {
                    malformed(format!("invalid \\x escape `\\x{}`", hex))
                })?);
            }
            'u' => {
                let hex: String = chars.by_ref().take(4).collect();
                units.push(parse_hex(&hex, 4).ok_or_else(|| {
                    malformed(format!("invalid \\u escape `\\u{}`", hex))
                })?);
            }
            // any other escaped character stands for itself
            other => {
                let mut buf = [0u16; 2];
                units.extend_from_slice(other.encode_utf16(&mut buf));
            }
        }
    }

    String::from_utf16(&units).map_err(|err| malformed(err.to_string()))
}

fn parse_hex(hex: &str, len: usize) -> Option<u16> {
    if hex.len() != len || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u16::from_str_radix(hex, 16).ok()
}

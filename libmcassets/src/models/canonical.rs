//! Deterministic JSON text.
//!
//! Object keys are emitted in sorted order at every depth regardless of how
//! the [`Value`] map happens to be ordered, and the compact form escapes every
//! character outside printable ASCII as `\uXXXX` so the output is byte-stable
//! across platforms and editors.

use std::io;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::ser::{CompactFormatter, Formatter, PrettyFormatter};
use serde_json::Value;

/// Serializes a [`Value`] with its object entries sorted by key.
struct Sorted<'a>(&'a Value);

impl Serialize for Sorted<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.0 {
            Value::Object(map) => {
                let mut entries: Vec<(&String, &Value)> = map.iter().collect();
                entries.sort_by(|(left, _), (right, _)| left.cmp(right));

                let mut ser = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    ser.serialize_entry(key, &Sorted(value))?;
                }
                ser.end()
            }
            Value::Array(items) => {
                let mut ser = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    ser.serialize_element(&Sorted(item))?;
                }
                ser.end()
            }
            scalar => scalar.serialize(serializer),
        }
    }
}

/// Compact formatter that writes non-printable and non-ASCII characters as
/// lowercase `\uXXXX` escapes, using surrogate pairs above the BMP.
#[derive(Default)]
struct AsciiFormatter {
    inner: CompactFormatter,
}

impl Formatter for AsciiFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (idx, c) in fragment.char_indices() {
            if (' '..='~').contains(&c) {
                continue;
            }
            if start < idx {
                self.inner
                    .write_string_fragment(writer, &fragment[start..idx])?;
            }
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = idx + c.len_utf8();
        }
        if start < fragment.len() {
            self.inner.write_string_fragment(writer, &fragment[start..])?;
        }
        Ok(())
    }
}

/// Compact, key-sorted, ASCII-only JSON.
pub fn to_string(value: &Value) -> Result<String, serde_json::Error> {
    let mut out = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut out, AsciiFormatter::default());
    Sorted(value).serialize(&mut ser)?;
    // the formatter only ever writes ASCII
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Key-sorted JSON indented by two spaces. Strings are left unescaped.
pub fn to_string_pretty(value: &Value) -> Result<String, serde_json::Error> {
    let mut out = Vec::new();
    let mut ser =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"  "));
    Sorted(value).serialize(&mut ser)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    #[test]
    fn test_nested_keys_are_sorted() {
        let value = json!({
            "zeta": {"b": 1, "a": [{"y": true, "x": null}]},
            "alpha": "first",
        });
        assert_eq!(
            super::to_string(&value).unwrap(),
            r#"{"alpha":"first","zeta":{"a":[{"x":null,"y":true}],"b":1}}"#
        );
    }

    #[test]
    fn test_sorting_is_by_code_point() {
        let value = json!({"b": 0, "B": 0, "a_": 0, "a": 0, "é": 0});
        assert_eq!(
            super::to_string(&value).unwrap(),
            r#"{"B":0,"a":0,"a_":0,"b":0,"\u00e9":0}"#
        );
    }

    #[test]
    fn test_non_ascii_is_escaped() {
        let value = json!(["naïve", "\u{7f}", "tab\there", "😀"]);
        assert_eq!(
            super::to_string(&value).unwrap(),
            r#"["na\u00efve","\u007f","tab\there","\ud83d\ude00"]"#
        );
        let parsed: serde_json::Value =
            serde_json::from_str(&super::to_string(&value).unwrap()).unwrap();
        assert_eq!(parsed, value);
    }

    #[test]
    fn test_quotes_and_backslashes_keep_json_escapes() {
        let value = json!({"path": "a\\b", "quote": "say \"hi\"", "apostrophe": "it's"});
        assert_eq!(
            super::to_string(&value).unwrap(),
            r#"{"apostrophe":"it's","path":"a\\b","quote":"say \"hi\""}"#
        );
    }

    #[test]
    fn test_pretty_output_keeps_unicode() {
        let value = json!({"b": ["ü"], "a": {}});
        assert_eq!(
            super::to_string_pretty(&value).unwrap(),
            "{\n  \"a\": {},\n  \"b\": [\n    \"ü\"\n  ]\n}"
        );
    }
}

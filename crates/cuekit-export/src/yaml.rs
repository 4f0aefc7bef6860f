//! YAML output
//!
//! The value is serialized into a `serde_yaml` tree and written in block
//! style. Scalars are rendered by `serde_yaml`, except strings a YAML 1.1
//! reader would load as something else (`yes`, `off`, `y`), and strings
//! spanning several lines, which are written double-quoted.

use serde_yaml::{Mapping, Value as YamlValue};

use cuekit_eval::Value;

use crate::error::Result;
use crate::manifest::Manifest;

/// Booleans of YAML 1.1 that YAML 1.2 reads as plain strings
const YAML11_BOOLS: &[&str] = &[
    "y", "Y", "yes", "Yes", "YES", "n", "N", "no", "No", "NO", "on", "On", "ON", "off", "Off",
    "OFF",
];

/// Render a concrete value as a YAML document
pub fn to_yaml(value: &Value) -> Result<String> {
    let tree = serde_yaml::to_value(Manifest(value))?;
    let mut out = String::new();
    match &tree {
        YamlValue::Mapping(map) if !map.is_empty() => write_mapping(&mut out, map, 0)?,
        YamlValue::Sequence(seq) if !seq.is_empty() => write_sequence(&mut out, seq, 0)?,
        scalar => {
            out.push_str(&scalar_text(scalar)?);
            out.push('\n');
        }
    }
    Ok(out)
}

fn write_mapping(out: &mut String, map: &Mapping, indent: usize) -> Result<()> {
    for (key, value) in map {
        out.push_str(&" ".repeat(indent));
        out.push_str(&scalar_text(key)?);
        out.push(':');
        match value {
            YamlValue::Mapping(inner) if !inner.is_empty() => {
                out.push('\n');
                write_mapping(out, inner, indent + 2)?;
            }
            // Sequences under a key are not indented
            YamlValue::Sequence(inner) if !inner.is_empty() => {
                out.push('\n');
                write_sequence(out, inner, indent)?;
            }
            scalar => {
                out.push(' ');
                out.push_str(&scalar_text(scalar)?);
                out.push('\n');
            }
        }
    }
    Ok(())
}

fn write_sequence(out: &mut String, seq: &[YamlValue], indent: usize) -> Result<()> {
    let pad = " ".repeat(indent + 2);
    for item in seq {
        out.push_str(&" ".repeat(indent));
        out.push_str("- ");
        let mut body = String::new();
        match item {
            YamlValue::Mapping(inner) if !inner.is_empty() => {
                write_mapping(&mut body, inner, indent + 2)?;
            }
            YamlValue::Sequence(inner) if !inner.is_empty() => {
                write_sequence(&mut body, inner, indent + 2)?;
            }
            scalar => {
                body.push_str(&scalar_text(scalar)?);
                body.push('\n');
            }
        }
        // The first line continues after the dash
        out.push_str(body.strip_prefix(pad.as_str()).unwrap_or(&body));
    }
    Ok(())
}

fn scalar_text(value: &YamlValue) -> Result<String> {
    match value {
        YamlValue::String(s) => string_text(s),
        YamlValue::Mapping(_) => Ok("{}".to_string()),
        YamlValue::Sequence(_) => Ok("[]".to_string()),
        other => Ok(serde_yaml::to_string(other)?.trim_end().to_string()),
    }
}

fn string_text(s: &str) -> Result<String> {
    let rendered = serde_yaml::to_string(s)?;
    let rendered = rendered.trim_end_matches('\n');
    if rendered.contains('\n') || YAML11_BOOLS.contains(&s) {
        return Ok(serde_json::to_string(s)?);
    }
    Ok(rendered.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cuekit_eval::{evaluate_source, TagSet};

    fn yaml(src: &str) -> String {
        let value = evaluate_source("/y.cue", src, &TagSet::new()).unwrap();
        to_yaml(&value).unwrap()
    }

    #[test]
    fn test_yaml11_booleans_are_quoted() {
        assert_eq!(
            yaml("a: \"yes\"\nb: \"off\"\nc: \"yesterday\""),
            "a: \"yes\"\nb: \"off\"\nc: yesterday\n"
        );
    }

    #[test]
    fn test_ambiguous_scalars_stay_strings() {
        let out = yaml("a: \"123\"\nb: \"true\"\nc: \"null\"");
        let back: serde_yaml::Value = serde_yaml::from_str(&out).unwrap();
        for key in ["a", "b", "c"] {
            assert!(back[key].is_string(), "{} in {}", key, out);
        }
    }

    #[test]
    fn test_multiline_string_is_double_quoted() {
        assert_eq!(yaml("a: \"x\\ny\""), "a: \"x\\ny\"\n");
    }

    #[test]
    fn test_block_layout() {
        assert_eq!(
            yaml("l: [1, [2, 3], {k: \"v\", w: []}]\nm: {}"),
            "l:\n- 1\n- - 2\n  - 3\n- k: v\n  w: []\nm: {}\n"
        );
    }
}

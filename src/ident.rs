//! Utility functions for working with identifiers.

use heck::ToLowerCamelCase;
use itertools::Itertools;
use prost_types::FieldDescriptorProto;

/// Joins a nested type path into a single TypeScript identifier, used when
/// nested types are hoisted out of their parent's namespace.
pub fn to_flat_ident(type_path: &[impl AsRef<str>]) -> String {
    type_path.iter().map(AsRef::as_ref).join("_")
}

/// The proto3 JSON name of a field.
///
/// `protoc` fills in `json_name` for every field it hands to a plugin, the
/// fallback only matters for hand built descriptors.
pub fn to_json_name(field: &FieldDescriptorProto) -> String {
    match &field.json_name {
        Some(json_name) if !json_name.is_empty() => json_name.clone(),
        _ => field.name().to_lower_camel_case(),
    }
}

/// Quotes `s` as a double quoted TypeScript string literal.
pub fn to_string_literal(s: &str) -> String {
    let mut literal = String::with_capacity(s.len() + 2);
    literal.push('"');
    for c in s.chars() {
        match c {
            '"' => literal.push_str("\\\""),
            '\\' => literal.push_str("\\\\"),
            '\n' => literal.push_str("\\n"),
            '\r' => literal.push_str("\\r"),
            '\t' => literal.push_str("\\t"),
            '\u{2028}' => literal.push_str("\\u2028"),
            '\u{2029}' => literal.push_str("\\u2029"),
            c if c.is_control() => literal.push_str(&format!("\\u{:04x}", c as u32)),
            c => literal.push(c),
        }
    }
    literal.push('"');
    literal
}

/// Decodes a C-escaped `bytes` default value, as found in
/// `FieldDescriptorProto::default_value`.
///
/// Returns `None` if the string ends in the middle of an escape sequence.
pub fn unescape_c_escape_string(s: &str) -> Option<Vec<u8>> {
    let src = s.as_bytes();
    let len = src.len();
    let mut dst = Vec::with_capacity(len);

    let mut p = 0;
    while p < len {
        if src[p] != b'\\' {
            dst.push(src[p]);
            p += 1;
            continue;
        }

        p += 1;
        let escaped = *src.get(p)?;
        p += 1;
        match escaped {
            b'a' => dst.push(0x07),
            b'b' => dst.push(0x08),
            b'f' => dst.push(0x0C),
            b'n' => dst.push(0x0A),
            b'r' => dst.push(0x0D),
            b't' => dst.push(0x09),
            b'v' => dst.push(0x0B),
            b'\\' | b'?' | b'\'' | b'"' => dst.push(escaped),
            b'0'..=b'7' => {
                let mut octal = u32::from(escaped - b'0');
                for _ in 0..2 {
                    match src.get(p) {
                        Some(digit @ b'0'..=b'7') => {
                            octal = octal * 8 + u32::from(digit - b'0');
                            p += 1;
                        }
                        _ => break,
                    }
                }
                dst.push(u8::try_from(octal).ok()?);
            }
            b'x' | b'X' => {
                let hex = s.get(p..p + 2)?;
                dst.push(u8::from_str_radix(hex, 16).ok()?);
                p += 2;
            }
            _ => return None,
        }
    }
    Some(dst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unescape_c_escape_string() {
        assert_eq!(Some(b"hello world".to_vec()), unescape_c_escape_string("hello world"));
        assert_eq!(Some(b"\0".to_vec()), unescape_c_escape_string(r"\0"));
        assert_eq!(Some(vec![0o12, b'3']), unescape_c_escape_string(r"\0123"));
        assert_eq!(Some(vec![0x9a, b'b']), unescape_c_escape_string(r"\x9ab"));
        assert_eq!(Some(b"\"q\"\n".to_vec()), unescape_c_escape_string(r#"\"q\"\n"#));
        assert_eq!(None, unescape_c_escape_string(r"\"));
        assert_eq!(None, unescape_c_escape_string(r"\x9"));
    }

    #[test]
    fn test_to_flat_ident() {
        assert_eq!("Outer", to_flat_ident(&["Outer"]));
        assert_eq!("Outer_Inner_Leaf", to_flat_ident(&["Outer", "Inner", "Leaf"]));
    }

    #[test]
    fn test_to_json_name() {
        let field = |name: &str, json_name: Option<&str>| FieldDescriptorProto {
            name: Some(name.to_owned()),
            json_name: json_name.map(str::to_owned),
            ..Default::default()
        };

        assert_eq!("fooBar", to_json_name(&field("foo_bar", None)));
        assert_eq!("fieldName7", to_json_name(&field("fieldName7", None)));
        assert_eq!("fieldName8", to_json_name(&field("FieldName8", None)));
        assert_eq!("custom", to_json_name(&field("foo_bar", Some("custom"))));
        assert_eq!("fooBar", to_json_name(&field("foo_bar", Some(""))));
    }

    #[test]
    fn test_to_string_literal() {
        assert_eq!(r#""plain""#, to_string_literal("plain"));
        assert_eq!(r#""say \"hi\"""#, to_string_literal(r#"say "hi""#));
        assert_eq!(r#""a\\b""#, to_string_literal(r"a\b"));
        assert_eq!(r#""line\nbreak""#, to_string_literal("line\nbreak"));
        assert_eq!(r#""\u0000""#, to_string_literal("\0"));
    }
}

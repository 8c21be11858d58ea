//! URI functions: `encodeURI`, `decodeURI`, `encodeURIComponent` and
//! `decodeURIComponent`, plus the legacy `escape` and `unescape`.
//!
//! Percent-encoding works on UTF-8 bytes; `escape` works on UTF-16 code units.

use super::{arg, define_method};
use crate::error::ErrorKind;
use crate::runtime::interpreter::{Interpreter, JsResult};
use crate::runtime::value::Value;

/// Marks no URI function escapes, besides ASCII letters and digits.
const URI_MARKS: &str = "-_.!~*'()";

/// Characters with a meaning inside a URI; `encodeURI` and `decodeURI` keep them.
const URI_RESERVED: &str = ";/?:@&=+$,#";

/// Characters `escape` keeps, besides ASCII letters and digits.
const ESCAPE_KEEPS: &str = "@*_+-./";

const MALFORMED: &str = "URI malformed";

pub fn register(interpreter: &mut Interpreter) {
    let global = interpreter.global.clone();
    define_method(interpreter, &global, "encodeURI", 1, encode_uri);
    define_method(interpreter, &global, "decodeURI", 1, decode_uri);
    define_method(interpreter, &global, "encodeURIComponent", 1, encode_uri_component);
    define_method(interpreter, &global, "decodeURIComponent", 1, decode_uri_component);
    define_method(interpreter, &global, "escape", 1, escape);
    define_method(interpreter, &global, "unescape", 1, unescape);
}

fn is_reserved(c: char) -> bool {
    URI_RESERVED.contains(c)
}

fn encode_uri(interpreter: &mut Interpreter, _this: &Value, args: &[Value]) -> JsResult<Value> {
    let input = interpreter.to_string(&arg(args, 0))?;
    Ok(Value::from(encode(&input, is_reserved)))
}

fn encode_uri_component(
    interpreter: &mut Interpreter,
    _this: &Value,
    args: &[Value],
) -> JsResult<Value> {
    let input = interpreter.to_string(&arg(args, 0))?;
    Ok(Value::from(encode(&input, |_| false)))
}

fn decode_uri(interpreter: &mut Interpreter, _this: &Value, args: &[Value]) -> JsResult<Value> {
    let input = interpreter.to_string(&arg(args, 0))?;
    decode(&input, is_reserved)
        .map(Value::from)
        .ok_or_else(|| interpreter.throw_error(ErrorKind::URIError, MALFORMED))
}

fn decode_uri_component(
    interpreter: &mut Interpreter,
    _this: &Value,
    args: &[Value],
) -> JsResult<Value> {
    let input = interpreter.to_string(&arg(args, 0))?;
    decode(&input, |_| false)
        .map(Value::from)
        .ok_or_else(|| interpreter.throw_error(ErrorKind::URIError, MALFORMED))
}

/// Percent-encodes the UTF-8 bytes of every character that is neither
/// unreserved nor accepted by `keep`.
fn encode(input: &str, keep: impl Fn(char) -> bool) -> String {
    let mut out = String::with_capacity(input.len());
    let mut buf = [0u8; 4];
    for c in input.chars() {
        if c.is_ascii_alphanumeric() || URI_MARKS.contains(c) || keep(c) {
            out.push(c);
            continue;
        }
        for byte in c.encode_utf8(&mut buf).bytes() {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

/// Reverses percent-encoding. An escape that decodes to a character accepted
/// by `preserve` stays as written. `None` when the input is malformed.
fn decode(input: &str, preserve: impl Fn(char) -> bool) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'%' {
            let c = input[i..].chars().next()?;
            out.push(c);
            i += c.len_utf8();
            continue;
        }
        let start = i;
        let lead = hex_byte(bytes, i)?;
        i += 3;
        if lead < 0x80 {
            let c = char::from(lead);
            if preserve(c) {
                out.push_str(&input[start..i]);
            } else {
                out.push(c);
            }
            continue;
        }
        let width = match lead {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => return None,
        };
        let mut encoded = vec![lead];
        for _ in 1..width {
            if bytes.get(i) != Some(&b'%') {
                return None;
            }
            let byte = hex_byte(bytes, i)?;
            if byte & 0xC0 != 0x80 {
                return None;
            }
            encoded.push(byte);
            i += 3;
        }
        // Rejects overlong forms and encoded surrogates.
        out.push_str(std::str::from_utf8(&encoded).ok()?);
    }
    Some(out)
}

/// The byte written as `%XX` at `at`.
fn hex_byte(bytes: &[u8], at: usize) -> Option<u8> {
    let digits = bytes.get(at + 1..at + 3)?;
    if !digits.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    u8::from_str_radix(std::str::from_utf8(digits).ok()?, 16).ok()
}

fn escape(interpreter: &mut Interpreter, _this: &Value, args: &[Value]) -> JsResult<Value> {
    let input = interpreter.to_string(&arg(args, 0))?;
    let mut out = String::with_capacity(input.len());
    for unit in input.encode_utf16() {
        match char::from_u32(u32::from(unit)) {
            Some(c) if c.is_ascii_alphanumeric() || ESCAPE_KEEPS.contains(c) => out.push(c),
            _ if unit < 0x100 => out.push_str(&format!("%{:02X}", unit)),
            _ => out.push_str(&format!("%u{:04X}", unit)),
        }
    }
    Ok(Value::from(out))
}

/// Decodes `%uXXXX` and `%XX`; anything else, including a malformed escape,
/// is copied through.
fn unescape(interpreter: &mut Interpreter, _this: &Value, args: &[Value]) -> JsResult<Value> {
    let input = interpreter.to_string(&arg(args, 0))?;
    let units: Vec<u16> = input.encode_utf16().collect();
    let mut out = Vec::with_capacity(units.len());
    let mut i = 0;
    while i < units.len() {
        if units[i] == u16::from(b'%') {
            if units.get(i + 1) == Some(&u16::from(b'u')) {
                if let Some(unit) = hex_units(&units, i + 2, 4) {
                    out.push(unit);
                    i += 6;
                    continue;
                }
            }
            if let Some(unit) = hex_units(&units, i + 1, 2) {
                out.push(unit);
                i += 3;
                continue;
            }
        }
        out.push(units[i]);
        i += 1;
    }
    Ok(Value::from(String::from_utf16_lossy(&out)))
}

/// Value of the `count` hex digits starting at `at`.
fn hex_units(units: &[u16], at: usize, count: usize) -> Option<u16> {
    units.get(at..at + count)?.iter().try_fold(0u16, |acc, &unit| {
        let digit = char::from_u32(u32::from(unit))?.to_digit(16)?;
        Some(acc * 16 + digit as u16)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_keeps_reserved_only_for_full_uris() {
        let input = "a b/c?d=é";
        assert_eq!(encode(input, is_reserved), "a%20b/c?d=%C3%A9");
        assert_eq!(encode(input, |_| false), "a%20b%2Fc%3Fd%3D%C3%A9");
    }

    #[test]
    fn test_decode_rejects_malformed_sequences() {
        assert_eq!(decode("%E2%82%AC", |_| false).as_deref(), Some("€"));
        assert_eq!(decode("%2F", is_reserved).as_deref(), Some("%2F"));
        for malformed in ["%", "%4", "%zz", "%+1", "%C3", "%C3%28", "%C0%AF", "%ED%A0%80", "%FF"] {
            assert!(decode(malformed, |_| false).is_none(), "{}", malformed);
        }
    }
}

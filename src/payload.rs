//! Pulling a JSON object out of a device response.
//!
//! Devices print log noise and echoed input around their replies, so the
//! object is taken from the first `{` to the last `}` and only then parsed.
//! The two steps fail separately, see [`PayloadError`].

use std::io::{self, Write};

use log::warn;
use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Serializer, Value};

use crate::error::PayloadError;

/// Banner printed before a response that could not be parsed
pub const PARSE_FAILURE: &str = "cannot parse response as JSON object:";

const INDENT: &[u8] = b"    ";

/// The text from the first `{` to the last `}`, both included
pub fn object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;

    if end < start {
        return None;
    }

    Some(&text[start..=end])
}

pub fn parse_payload(text: &str) -> Result<Value, PayloadError> {
    let span = object_span(text).ok_or(PayloadError::NoObject)?;
    Ok(serde_json::from_str(span)?)
}

/// Pretty-print with a fixed four space indent
pub fn to_pretty(value: &Value) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT));
    value.serialize(&mut ser)?;

    // serde_json only ever emits valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// How a response ends up on screen
#[derive(Debug)]
pub enum Rendered<'a> {
    Json(String),
    Raw { reason: PayloadError, text: &'a str },
}

pub fn render(text: &str) -> Rendered<'_> {
    match parse_payload(text).and_then(|value| Ok(to_pretty(&value)?)) {
        Ok(pretty) => Rendered::Json(pretty),
        Err(reason) => Rendered::Raw { reason, text },
    }
}

/// Print the response as pretty JSON, or the parse-failure banner followed by
/// the text untouched. Returns whether the response parsed.
pub fn parse_and_print<W: Write>(text: &str, out: &mut W) -> io::Result<bool> {
    match render(text) {
        Rendered::Json(pretty) => {
            writeln!(out, "{}", pretty)?;
            Ok(true)
        }
        Rendered::Raw { reason, text } => {
            warn!("{}", reason);
            writeln!(out, "{}", PARSE_FAILURE)?;
            writeln!(out, "{}", text)?;
            Ok(false)
        }
    }
}

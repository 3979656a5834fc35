//! HTML to searchable text.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static SCRIPT_OR_STYLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<(?:script|style)\b[^>]*>.*?</(?:script|style)\s*>").unwrap());
static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static ENTITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"&(#[xX][0-9a-fA-F]+|#\d+|[a-zA-Z]+);").unwrap());

fn decode_entity(caps: &Captures) -> String {
    let body = &caps[1];
    let decoded = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
    } else if let Some(dec) = body.strip_prefix('#') {
        dec.parse().ok().and_then(char::from_u32)
    } else {
        match body {
            "nbsp" => Some(' '),
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "dollar" => Some('$'),
            _ => None,
        }
    };
    decoded.map(String::from).unwrap_or_else(|| caps[0].to_string())
}

pub fn decode_entities(s: &str) -> String {
    ENTITY.replace_all(s, decode_entity).into_owned()
}

/// Collapse every whitespace run to one space and trim.
pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}

/// Visible text of a saved bill page on a single line.
///
/// Tags are dropped without inserting separators (adjacent cells run
/// together), except `<br>` which becomes a break.
pub fn flatten_html(html: &str) -> String {
    let s = SCRIPT_OR_STYLE.replace_all(html, " ");
    let s = COMMENT.replace_all(&s, " ");
    let s = LINE_BREAK.replace_all(&s, "\n");
    let s = TAG.replace_all(&s, "");
    normalize_ws(&decode_entities(&s))
}

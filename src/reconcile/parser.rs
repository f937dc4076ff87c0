//! Parsing of raw vCard records into canonical contacts.
//!
//! Records are line-oriented `NAME[;PARAM=..]:VALUE` text. Only two
//! fields matter here: `FN` (display name) and the first `TEL`. Anything
//! that cannot produce both degrades to `None`; a bad record is never an
//! error.

use crate::models::Contact;

/// Parses one raw record into a [`Contact`].
///
/// Returns `None` when the display name or phone field is missing, when
/// the phone normalizes to an empty string, or when the record is
/// otherwise unusable.
pub fn parse(raw: &str) -> Option<Contact> {
    let mut full_name: Option<String> = None;
    let mut phone: Option<String> = None;

    for line in unfold(raw) {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let Some(name) = field_name(key) else {
            continue;
        };

        if full_name.is_none() && name.eq_ignore_ascii_case("FN") {
            full_name = Some(unescape(value).trim().to_string());
        } else if phone.is_none() && name.eq_ignore_ascii_case("TEL") {
            // First TEL wins; later ones are alternates.
            phone = Some(normalize_phone(strip_tel_scheme(value)));
        }

        if full_name.is_some() && phone.is_some() {
            break;
        }
    }

    Contact::new(full_name?, phone?)
}

/// Strips whitespace and `( ) -` from a phone-like value.
///
/// Idempotent: normalizing an already-normalized value returns it
/// unchanged.
pub fn normalize_phone(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '(' | ')' | '-'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Joins folded continuation lines (leading space or tab) onto the
/// previous line.
fn unfold(raw: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for line in raw.lines() {
        if let Some(rest) = line.strip_prefix(|c: char| c == ' ' || c == '\t') {
            if let Some(last) = lines.last_mut() {
                last.push_str(rest);
                continue;
            }
        }
        lines.push(line.to_string());
    }
    lines
}

/// Extracts the bare property name from the part before the colon,
/// dropping parameters (`;TYPE=CELL`) and any group prefix (`item1.`).
fn field_name(key: &str) -> Option<&str> {
    let without_params = key.split(';').next()?;
    let name = without_params.rsplit('.').next()?.trim();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// vCard 4 allows `TEL;VALUE=uri:tel:+1-555-0100`.
fn strip_tel_scheme(value: &str) -> &str {
    let trimmed = value.trim();
    match trimmed.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("tel:") => &trimmed[4..],
        _ => trimmed,
    }
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push(' '),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

//! Pulls numbers out of arbitrary command output by position: "the 2nd number on line 3".
//! No per-tool parsing is involved, the caller only names a line and an occurrence.

pub mod monitor_spec;

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use tracing::trace;

pub use monitor_spec::{FieldRef, MonitorSpec};

/// A number as it appeared in the output.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedValue {
    pub value: f64,
    /// The matched substring, sign included.
    pub text: String,
    /// Fractional digits as written. "3.40" has a precision of 2 even though the value is 3.4.
    pub precision: usize,
}

impl ExtractedValue {
    pub fn parse(text: &str) -> Result<Self> {
        let value = text
            .parse::<f64>()
            .map_err(|e| anyhow!("Can't parse {text} into a number: {e}"))?;
        let precision = text
            .split_once('.')
            .map(|(_, fraction)| fraction.len())
            .unwrap_or(0);
        Ok(Self {
            value,
            text: text.to_string(),
            precision,
        })
    }
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Tries to match `[+-]?\d+(\.\d*)?` starting at `start`. Returns the end of the match.
fn match_number(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start;
    if matches!(bytes.get(i), Some(b'+' | b'-')) {
        i += 1;
    }
    let digits_start = i;
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    if i == digits_start {
        return None;
    }
    if bytes.get(i) == Some(&b'.') {
        i += 1;
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
    }
    Some(i)
}

/// Returns every numeric-looking substring of `line`, left to right.
///
/// A number has an optional sign, at least one digit and optionally a decimal point followed by
/// any digits. It has to start at the beginning of the line or right after a non-word character,
/// so "item2" contains no number while "item 2" and "item-2" do.
pub fn scan_numbers(line: &str) -> Vec<&str> {
    let bytes = line.as_bytes();
    let mut numbers = vec![];
    let mut i = 0;
    while i < bytes.len() {
        let at_boundary = line.is_char_boundary(i)
            && !line[..i].chars().next_back().is_some_and(is_word);
        match at_boundary.then(|| match_number(bytes, i)).flatten() {
            Some(end) => {
                // Matches are ASCII only, so both ends are char boundaries.
                numbers.push(&line[i..end]);
                i = end;
            }
            None => i += 1,
        }
    }
    numbers
}

/// Returns the value at `field`, or `None` when this output doesn't have it. A missing value is
/// not an error, the output of the watched command may simply be shorter this time.
pub fn extract_field(text: &str, field: FieldRef) -> Option<ExtractedValue> {
    let line = text.lines().nth(field.line.get() - 1)?;
    let number = *scan_numbers(line).get(field.field.get() - 1)?;
    // Everything the scanner accepts is a valid float, but a long enough digit run overflows it.
    ExtractedValue::parse(number)
        .ok()
        .filter(|value| value.value.is_finite())
}

/// Memoizes extraction for a single command output, so asking for the same field twice yields
/// the same value.
pub struct FieldCache<'a> {
    text: &'a str,
    values: HashMap<FieldRef, Option<ExtractedValue>>,
}

impl<'a> FieldCache<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            values: HashMap::new(),
        }
    }

    pub fn get(&mut self, field: FieldRef) -> Option<&ExtractedValue> {
        let text = self.text;
        self.values
            .entry(field)
            .or_insert_with(|| {
                let value = extract_field(text, field);
                trace!("Extracted {value:?} from {field}");
                value
            })
            .as_ref()
    }
}

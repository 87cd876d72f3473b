use serde::Serialize;
use serde_json::Number;

// 2^53, past this an f64 no longer holds every integer
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Value written to a single cell. Numbers go out as JSON numbers so the sheet keeps
/// its numeric formatting, everything else as text.
///
/// Only decimal text counts as a number: whitespace-only input, hex or binary literals
/// (`0x1A`, `0b101`) and booleans stay text rather than becoming `0`, `26` or `1`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(Number),
    Text(String),
}

impl CellValue {
    pub fn coerce(raw: &str) -> Self {
        parse_number(raw)
            .map(Self::Number)
            .unwrap_or_else(|| Self::Text(raw.to_string()))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Self::Number(_))
    }
}

fn parse_number(raw: &str) -> Option<Number> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let parsed: f64 = trimmed.parse().ok()?;
    if !parsed.is_finite() {
        return None;
    }

    if parsed.fract() == 0.0 && parsed.abs() < MAX_SAFE_INTEGER {
        return Some(Number::from(parsed as i64));
    }

    Number::from_f64(parsed)
}

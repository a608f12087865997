//! Duration tokens used by daily tasks.
//!
//! Tokens look like `45m`, `2h`, `1h 30m` or the open-ended `>4h`. Bare
//! integers count as minutes. Anything else parses to zero; a bad token is
//! never an error.

use std::sync::OnceLock;

use regex_lite::Regex;

/// Token meaning "more than four hours", counted as exactly four.
pub const OVER_FOUR_HOURS: &str = ">4h";
const OVER_FOUR_HOURS_MINUTES: u32 = 240;

const HOUR_GLYPH: &str = "س";
const MINUTE_GLYPH: &str = "د";

/// Choices offered when picking a duration, in planner order.
pub const DURATION_OPTIONS: &[&str] = &[
    "0m", "15m", "30m", "45m", "1h", "1h 15m", "1h 30m", "1h 45m", "2h", "2h 15m", "2h 30m",
    "2h 45m", "3h", "3h 15m", "3h 30m", "3h 45m", "4h", OVER_FOUR_HOURS,
];

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Hours and minutes accept both the ASCII units and the display glyphs so
    // formatted values read back to the same count.
    RE.get_or_init(|| {
        Regex::new(r"^(?:(\d+)\s*[hس])?\s*(?:(\d+)\s*[mد])?$").expect("duration regex is valid")
    })
}

/// Parses a duration token into minutes.
pub fn parse_duration(token: &str) -> u32 {
    let token = token.trim();
    if token.is_empty() {
        return 0;
    }
    if token == OVER_FOUR_HOURS {
        return OVER_FOUR_HOURS_MINUTES;
    }
    if token.bytes().all(|b| b.is_ascii_digit()) {
        return token.parse().unwrap_or(0);
    }

    let Some(caps) = token_re().captures(token) else {
        return 0;
    };
    let hours = caps.get(1).map(|m| m.as_str().parse::<u32>());
    let minutes = caps.get(2).map(|m| m.as_str().parse::<u32>());
    if hours.is_none() && minutes.is_none() {
        return 0;
    }
    let hours = match hours.transpose() {
        Ok(h) => h.unwrap_or(0),
        Err(_) => return 0,
    };
    let minutes = match minutes.transpose() {
        Ok(m) => m.unwrap_or(0),
        Err(_) => return 0,
    };
    hours
        .checked_mul(60)
        .and_then(|h| h.checked_add(minutes))
        .unwrap_or(0)
}

/// Formats minutes for display using the locale hour/minute glyphs.
///
/// Zero parts are omitted; zero overall renders as `0د`.
pub fn format_minutes(mins: u32) -> String {
    if mins == 0 {
        return format!("0{}", MINUTE_GLYPH);
    }
    let h = mins / 60;
    let m = mins % 60;
    match (h, m) {
        (0, m) => format!("{}{}", m, MINUTE_GLYPH),
        (h, 0) => format!("{}{}", h, HOUR_GLYPH),
        (h, m) => format!("{}{} {}{}", h, HOUR_GLYPH, m, MINUTE_GLYPH),
    }
}

/// Formats minutes as an ASCII token that [`parse_duration`] reads back.
pub fn canonical_duration(mins: u32) -> String {
    let h = mins / 60;
    let m = mins % 60;
    match (h, m) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h {}m", h, m),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_forms() {
        assert_eq!(parse_duration("45m"), 45);
        assert_eq!(parse_duration("2h"), 120);
        assert_eq!(parse_duration("1h 30m"), 90);
        assert_eq!(parse_duration("1h30m"), 90);
        assert_eq!(parse_duration(" 15 "), 15);
        assert_eq!(parse_duration(">4h"), 240);
    }

    #[test]
    fn malformed_tokens_are_zero() {
        assert_eq!(parse_duration(""), 0);
        assert_eq!(parse_duration("soon"), 0);
        assert_eq!(parse_duration("30m 1h"), 0);
        assert_eq!(parse_duration("1.5h"), 0);
        assert_eq!(parse_duration("h"), 0);
        assert_eq!(parse_duration("99999999999h"), 0);
    }

    #[test]
    fn formats_with_glyphs() {
        assert_eq!(format_minutes(0), "0د");
        assert_eq!(format_minutes(45), "45د");
        assert_eq!(format_minutes(120), "2س");
        assert_eq!(format_minutes(135), "2س 15د");
    }

    #[test]
    fn formatted_values_read_back() {
        for mins in [0, 5, 60, 75, 240, 605] {
            assert_eq!(parse_duration(&format_minutes(mins)), mins);
            assert_eq!(parse_duration(&canonical_duration(mins)), mins);
        }
    }

    #[test]
    fn parse_is_idempotent_on_canonical_output() {
        for token in DURATION_OPTIONS.iter().chain(["7", "junk", "3h 5m"].iter()) {
            let once = parse_duration(token);
            assert_eq!(parse_duration(&canonical_duration(once)), once, "{token}");
        }
    }
}

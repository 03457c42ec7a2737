//! Raw cell text to typed values.
//!
//! Numeric coercion rules, in order:
//!
//! 1. whitespace, thousands separators, currency symbols and the word
//!    "approximately" are removed;
//! 2. a scale word (`trillion`, `billion`, `million`) anywhere in the text sets
//!    a multiplier applied last;
//! 3. the leading run of digits, one decimal point, a leading minus sign and
//!    inequality markers is collected, and anything after it is ignored;
//! 4. inequality markers are dropped and the bound is parsed literally;
//! 5. unparseable input is NaN, sentinel or not;
//! 6. a `%` anywhere divides by 100, rounded to six decimals.

use itertools::Itertools;
use log::{debug, warn};

pub const TEXT_PLACEHOLDER: &str = "NA";

const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥'];
const APPROXIMATELY: &str = "approximately";
const SCALE_WORDS: &[(&str, f64)] = &[("trillion", 1e12), ("billion", 1e9), ("million", 1e6)];
const PERCENT_PRECISION: f64 = 1e6;

/// Strips surrounding whitespace and label colons from a declared name.
pub fn clean_name(name: &str) -> String {
    name.trim().replace(':', "").trim().to_string()
}

/// Recognized missing-value markers: `na`, `nan`, anything starting with
/// `na`, or anything mentioning a note.
pub fn is_missing_sentinel(raw: &str) -> bool {
    let lowered = raw.trim().to_lowercase();
    lowered.starts_with("na") || lowered.contains("note")
}

fn scale_factor(compact: &str) -> f64 {
    SCALE_WORDS
        .iter()
        .find(|(word, _)| compact.contains(word))
        .map_or(1.0, |(_, factor)| *factor)
}

fn leading_numeric_run(compact: &str) -> String {
    let mut run = String::new();
    let mut seen_digit = false;
    let mut seen_point = false;
    for ch in compact.chars() {
        match ch {
            '0'..='9' => {
                seen_digit = true;
                run.push(ch);
            }
            '.' if !seen_point => {
                seen_point = true;
                run.push(ch);
            }
            '-' if !seen_digit && !seen_point && !run.contains('-') => run.push(ch),
            '<' | '>' if !seen_digit && !seen_point => run.push(ch),
            _ => break,
        }
    }
    run
}

fn round_to_precision(value: f64) -> f64 {
    (value * PERCENT_PRECISION).round() / PERCENT_PRECISION
}

pub fn coerce_numeric(raw: &str) -> f64 {
    let lowered = raw.to_lowercase();
    let compact: String = lowered
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',' && !CURRENCY_SYMBOLS.contains(c))
        .collect();
    let compact = compact.replace(APPROXIMATELY, "");
    let scale = scale_factor(&compact);

    let run = leading_numeric_run(&compact);
    let bound: String = run.chars().filter(|c| !matches!(c, '<' | '>')).collect();
    let Ok(mut number) = bound.parse::<f64>() else {
        if is_missing_sentinel(raw) {
            debug!("Treating '{}' as missing", raw.trim());
        } else {
            warn!("Could not convert '{}' to a number; storing NaN", raw.trim());
        }
        return f64::NAN;
    };
    if raw.contains('%') {
        number = round_to_precision(number / 100.0);
    }
    number * scale
}

/// Collapses whitespace runs; blank text becomes [`TEXT_PLACEHOLDER`].
pub fn coerce_text(raw: &str) -> String {
    let collapsed = raw.split_whitespace().join(" ");
    if collapsed.is_empty() {
        TEXT_PLACEHOLDER.to_string()
    } else {
        collapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerce_numeric_applies_scale_words() {
        assert_eq!(coerce_numeric("1,234.5 million"), 1_234_500_000.0);
        assert_eq!(coerce_numeric("$20.1 billion (2017 est.)"), 20.1 * 1e9);
        assert_eq!(coerce_numeric("3 trillion"), 3e12);
    }

    #[test]
    fn coerce_numeric_handles_percentages() {
        assert_eq!(coerce_numeric("45%"), 0.45);
        assert_eq!(coerce_numeric("-2.5% (2017 est.)"), -0.025);
        assert_eq!(coerce_numeric("12.3456789%"), 0.123457);
    }

    #[test]
    fn coerce_numeric_drops_inequality_direction() {
        assert_eq!(coerce_numeric("<5"), 5.0);
        assert_eq!(coerce_numeric(">5"), 5.0);
        assert_eq!(coerce_numeric("<0.1%"), 0.001);
    }

    #[test]
    fn coerce_numeric_truncates_trailing_units() {
        assert_eq!(coerce_numeric("652,230 sq km"), 652_230.0);
        assert_eq!(coerce_numeric("approximately 1,000 km"), 1000.0);
        assert_eq!(coerce_numeric("1.2.3"), 1.2);
    }

    #[test]
    fn coerce_numeric_returns_nan_for_unparseable_text() {
        assert!(coerce_numeric("NA").is_nan());
        assert!(coerce_numeric("nan").is_nan());
        assert!(coerce_numeric("see note").is_nan());
        assert!(coerce_numeric("garbage").is_nan());
        assert!(coerce_numeric("").is_nan());
        assert!(coerce_numeric("-").is_nan());
    }

    #[test]
    fn missing_sentinels() {
        assert!(is_missing_sentinel(" NA "));
        assert!(is_missing_sentinel("nan"));
        assert!(is_missing_sentinel("NA (2019)"));
        assert!(is_missing_sentinel("see note below"));
        assert!(!is_missing_sentinel("garbage"));
    }

    #[test]
    fn coerce_text_collapses_and_substitutes_placeholder() {
        assert_eq!(coerce_text("  Kabul \n\t (capital)  "), "Kabul (capital)");
        assert_eq!(coerce_text(" \n "), TEXT_PLACEHOLDER);
    }

    #[test]
    fn clean_name_removes_colons() {
        assert_eq!(clean_name(" total: "), "total");
        assert_eq!(clean_name("land :"), "land");
    }
}

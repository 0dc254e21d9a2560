//! Answer normalization and comparison.
//!
//! Decides whether a raw submitted answer matches a question's answer key.
//! Malformed input is never an error here, it simply does not match.

use crate::model::{AnswerKey, QuestionType};

/// Minimum number of fractional digits for a decimal to be accepted as an
/// approximation of a non-terminating expected value (e.g. `.666` for `2/3`).
const MIN_APPROX_DIGITS: usize = 3;

/// Longest digit run accepted in one grid-in number. Keeps every cross
/// product below `i128::MAX`.
const MAX_DIGITS: usize = 18;

/// Returns `true` if `submitted` matches any accepted value of `expected`.
pub fn answers_match(expected: &AnswerKey, submitted: &str, kind: QuestionType) -> bool {
    expected
        .values()
        .iter()
        .any(|value| value_matches(value, submitted, kind))
}

fn value_matches(expected: &str, submitted: &str, kind: QuestionType) -> bool {
    match kind {
        QuestionType::MultipleChoice => match (normalize_choice(expected), normalize_choice(submitted)) {
            (Some(e), Some(s)) => e == s,
            _ => false,
        },
        QuestionType::GridIn => grid_in_matches(expected, submitted),
        QuestionType::FreeResponse => {
            let submitted = normalize_text(submitted);
            !submitted.is_empty() && normalize_text(expected) == submitted
        }
        QuestionType::Exact => !submitted.is_empty() && expected == submitted,
    }
}

/// Normalize a multiple-choice answer to its uppercase letter.
///
/// Accepts `b`, ` B `, `(B)`, `B)` and `B.`.
pub fn normalize_choice(raw: &str) -> Option<char> {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .or_else(|| trimmed.strip_suffix(')'))
        .or_else(|| trimmed.strip_suffix('.'))
        .unwrap_or(trimmed)
        .trim();

    let mut chars = inner.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Some(c.to_ascii_uppercase()),
        _ => None,
    }
}

fn normalize_text(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// A parsed grid-in value, held as an exact fraction.
///
/// Decimals keep the denominator they were written with, so `0.50` is
/// `50/100`. Fractions are kept as written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridInValue {
    pub numerator: i128,
    /// Always positive.
    pub denominator: i128,
    /// Fractional digits written, for decimal input. `None` for fractions
    /// and integers.
    pub decimal_places: Option<usize>,
}

impl GridInValue {
    /// Approximate value, for display.
    pub fn to_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Exact numeric equality.
    pub fn equals(&self, other: &GridInValue) -> bool {
        self.numerator * other.denominator == other.numerator * self.denominator
    }

    /// This value at `places` fractional digits, truncated toward zero and
    /// rounded half away from zero, as integers scaled by `10^places`.
    fn at_places(&self, places: usize) -> (i128, i128) {
        let scaled = self.numerator.abs() * 10i128.pow(places as u32);
        let truncated = scaled / self.denominator;
        let rounded = (2 * scaled + self.denominator) / (2 * self.denominator);
        let sign = self.numerator.signum();
        (sign * truncated, sign * rounded)
    }
}

/// Parse a grid-in response: an integer, a decimal (`.5`, `0.50`), or a
/// simple fraction (`1/2`), optionally negative.
///
/// Mixed numbers, exponents, zero denominators, decimal fractions and numbers
/// longer than 18 digits are rejected.
pub fn parse_grid_in(raw: &str) -> Option<GridInValue> {
    let trimmed = raw.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    if body.is_empty() {
        return None;
    }

    let parsed = if let Some((num, den)) = body.split_once('/') {
        let (num, num_places) = parse_decimal(num)?;
        let (den, den_places) = parse_decimal(den)?;
        if num_places.is_some() || den_places.is_some() || den == 0 {
            return None;
        }
        GridInValue {
            numerator: num,
            denominator: den,
            decimal_places: None,
        }
    } else {
        let (digits, places) = parse_decimal(body)?;
        GridInValue {
            numerator: digits,
            denominator: 10i128.pow(places.unwrap_or(0) as u32),
            decimal_places: places,
        }
    };

    Some(GridInValue {
        numerator: if negative { -parsed.numerator } else { parsed.numerator },
        ..parsed
    })
}

/// Parse unsigned digits with at most one decimal point into the integer
/// formed by all digits and the count of fractional digits.
fn parse_decimal(s: &str) -> Option<(i128, Option<usize>)> {
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    let (int, frac) = match s.split_once('.') {
        Some((int, frac)) => {
            if frac.contains('.') || (int.is_empty() && frac.is_empty()) {
                return None;
            }
            (int, Some(frac))
        }
        None => (s, None),
    };
    let digits = format!("{int}{}", frac.unwrap_or(""));
    if digits.len() > MAX_DIGITS {
        return None;
    }
    let value = digits.parse::<i128>().ok()?;
    Some((value, frac.map(str::len)))
}

fn grid_in_matches(expected: &str, submitted: &str) -> bool {
    let (Some(expected), Some(submitted)) = (parse_grid_in(expected), parse_grid_in(submitted))
    else {
        return false;
    };

    if expected.equals(&submitted) {
        return true;
    }

    match submitted.decimal_places {
        Some(places) if places >= MIN_APPROX_DIGITS => {
            let (truncated, rounded) = expected.at_places(places);
            submitted.numerator == truncated || submitted.numerator == rounded
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(v: &str) -> AnswerKey {
        AnswerKey::from(v)
    }

    #[test]
    fn multiple_choice_ignores_case_and_whitespace() {
        assert!(answers_match(&key("B"), "b", QuestionType::MultipleChoice));
        assert!(answers_match(&key("B"), "  B \n", QuestionType::MultipleChoice));
        assert!(!answers_match(&key("B"), "C", QuestionType::MultipleChoice));
    }

    #[test]
    fn multiple_choice_letter_decorations() {
        assert!(answers_match(&key("C"), "(c)", QuestionType::MultipleChoice));
        assert!(answers_match(&key("C"), "C)", QuestionType::MultipleChoice));
        assert!(answers_match(&key("C"), "c.", QuestionType::MultipleChoice));
        assert!(!answers_match(&key("C"), "CC", QuestionType::MultipleChoice));
        assert!(!answers_match(&key("C"), "", QuestionType::MultipleChoice));
    }

    #[test]
    fn grid_in_fraction_and_decimal_equivalence() {
        assert!(answers_match(&key("1/2"), "0.5", QuestionType::GridIn));
        assert!(answers_match(&key("1/2"), "0.50", QuestionType::GridIn));
        assert!(answers_match(&key("1/2"), ".5", QuestionType::GridIn));
        assert!(answers_match(&key("0.5"), "2/4", QuestionType::GridIn));
        assert!(answers_match(&key("-3"), "-6/2", QuestionType::GridIn));
        assert!(!answers_match(&key("1/2"), "0.51", QuestionType::GridIn));
    }

    #[test]
    fn grid_in_accepts_truncated_or_rounded_repeating_decimals() {
        assert!(answers_match(&key("2/3"), ".666", QuestionType::GridIn));
        assert!(answers_match(&key("2/3"), ".667", QuestionType::GridIn));
        assert!(answers_match(&key("2/3"), "0.6667", QuestionType::GridIn));
        assert!(!answers_match(&key("2/3"), ".67", QuestionType::GridIn));
        assert!(!answers_match(&key("2/3"), ".665", QuestionType::GridIn));
    }

    #[test]
    fn grid_in_malformed_never_matches() {
        for bad in ["", "  ", "abc", "1 1/2", "1/0", "1e3", "inf", "NaN", "1..2", ".", "-", "1/2/3"] {
            assert!(
                !answers_match(&key("1/2"), bad, QuestionType::GridIn),
                "{bad:?} should not match"
            );
        }
    }

    #[test]
    fn any_of_key_accepts_each_value() {
        let key = AnswerKey::AnyOf(vec!["3.5".into(), "7/2".into()]);
        assert!(answers_match(&key, "3.5", QuestionType::GridIn));
        assert!(answers_match(&key, "7/2", QuestionType::GridIn));
        assert!(!answers_match(&key, "3", QuestionType::GridIn));
    }

    #[test]
    fn free_response_collapses_whitespace() {
        let key = key("New  York");
        assert!(answers_match(&key, " new york ", QuestionType::FreeResponse));
        assert!(!answers_match(&key, "newyork", QuestionType::FreeResponse));
        assert!(!answers_match(&AnswerKey::from(""), "", QuestionType::FreeResponse));
    }

    #[test]
    fn exact_is_byte_exact() {
        assert!(answers_match(&key("x^2"), "x^2", QuestionType::Exact));
        assert!(!answers_match(&key("x^2"), "X^2", QuestionType::Exact));
        assert!(!answers_match(&key("x^2"), " x^2", QuestionType::Exact));
    }

    #[test]
    fn parse_grid_in_reports_decimal_places() {
        assert_eq!(parse_grid_in("0.50").unwrap().decimal_places, Some(2));
        assert_eq!(parse_grid_in("12").unwrap().decimal_places, None);
        assert_eq!(parse_grid_in("3/4").unwrap().to_f64(), 0.75);
        assert_eq!(parse_grid_in("-0.25").unwrap().numerator, -25);
        assert!(parse_grid_in("1.5/2").is_none());
        assert!(parse_grid_in("1234567890123456789").is_none());
    }

    #[test]
    fn grid_in_terminating_decimals_are_compared_exactly() {
        assert!(!answers_match(&key("1.001"), "1.000", QuestionType::GridIn));
        assert!(answers_match(&key("1.001"), "1.001", QuestionType::GridIn));
        assert!(answers_match(&key("1.001"), "1.0010", QuestionType::GridIn));

        let mut wrong = Vec::new();
        for whole in 0..50 {
            for frac in 1..1000 {
                let expected = format!("{whole}.{frac:03}");
                let below = format!("{whole}.{:03}", frac - 1);
                if answers_match(&key(&expected), &below, QuestionType::GridIn) {
                    wrong.push((expected, below));
                }
            }
        }
        assert!(wrong.is_empty(), "{} accepted, e.g. {:?}", wrong.len(), &wrong[..wrong.len().min(5)]);
    }

    #[test]
    fn grid_in_has_no_tolerance_around_zero() {
        assert!(!answers_match(&key("0"), "0.0000000001", QuestionType::GridIn));
        assert!(answers_match(&key("0"), "0.000", QuestionType::GridIn));
        assert!(answers_match(&key("0"), "-0", QuestionType::GridIn));
    }

    #[test]
    fn grid_in_negative_approximations() {
        assert!(answers_match(&key("-2/3"), "-.666", QuestionType::GridIn));
        assert!(answers_match(&key("-2/3"), "-.667", QuestionType::GridIn));
        assert!(!answers_match(&key("-2/3"), ".667", QuestionType::GridIn));
    }
}

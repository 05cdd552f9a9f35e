// Folds free-text effort estimates ("2 dni", "4h", "2+4") into one total.
//
// Wording follows the Polish convention used in the generated offers:
// "dzień"/"dni" for days and "godzina"/"godzin" for hours.

use regex::Regex;
use std::sync::OnceLock;

const DAY_SINGULAR: &str = "dzień";
const DAY_PLURAL: &str = "dni";
const HOUR_SINGULAR: &str = "godzina";
const HOUR_PLURAL: &str = "godzin";

fn days_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(\d+)\s*(?:dni|dzień|dzien|d)\b").expect("days pattern is valid")
    })
}

fn hours_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(\d+)\s*(?:godzin[ay]?|godz|h|g)\b").expect("hours pattern is valid")
    })
}

/// A normalized duration. Rendering puts days first and drops zero parts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DurationValue {
    pub days: u64,
    pub hours: u64,
}

impl DurationValue {
    /// Parses one raw expression. Anything unrecognised is zero.
    pub fn parse(expression: &str) -> Self {
        let mut value = Self::default();
        if expression.trim().is_empty() {
            return value;
        }

        let days = first_number(days_pattern(), expression);
        let hours = first_number(hours_pattern(), expression);
        value.days += days.unwrap_or(0);
        value.hours += hours.unwrap_or(0);

        // Compact "days+hours" form, only when no unit word matched.
        if days.is_none() && hours.is_none() && expression.contains('+') {
            let compact: String = expression.chars().filter(|c| !c.is_whitespace()).collect();
            let parts: Vec<&str> = compact.split('+').collect();
            if let [left, right] = parts.as_slice() {
                if let (Some(d), Some(h)) = (parse_digits(left), parse_digits(right)) {
                    value.days += d;
                    value.hours += h;
                }
            }
        }

        value
    }

    pub fn render(&self) -> String {
        let mut parts = Vec::new();
        if self.days > 0 {
            let word = if self.days == 1 {
                DAY_SINGULAR
            } else {
                DAY_PLURAL
            };
            parts.push(format!("{} {}", self.days, word));
        }
        if self.hours > 0 {
            let word = if self.hours == 1 {
                HOUR_SINGULAR
            } else {
                HOUR_PLURAL
            };
            parts.push(format!("{} {}", self.hours, word));
        }
        parts.join(" + ")
    }
}

impl std::ops::Add for DurationValue {
    type Output = DurationValue;

    fn add(self, other: DurationValue) -> DurationValue {
        DurationValue {
            days: self.days.saturating_add(other.days),
            hours: self.hours.saturating_add(other.hours),
        }
    }
}

fn first_number(pattern: &Regex, text: &str) -> Option<u64> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn parse_digits(text: &str) -> Option<u64> {
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Sums every expression and renders the total; `""` when the total is zero.
pub fn sum_time_fields(expressions: &[&str]) -> String {
    expressions
        .iter()
        .map(|expr| DurationValue::parse(expr))
        .fold(DurationValue::default(), |acc, v| acc + v)
        .render()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn days_and_hours_from_separate_fields() {
        assert_eq!(sum_time_fields(&["2 dni", "4h"]), "2 dni + 4 godzin");
    }

    #[test]
    fn compact_form_matches_verbose_form() {
        assert_eq!(
            sum_time_fields(&["2+4"]),
            sum_time_fields(&["2 dni", "4 godziny"])
        );
        assert_eq!(sum_time_fields(&["2 + 4"]), "2 dni + 4 godzin");
    }

    #[test]
    fn empty_and_garbage_inputs_render_empty() {
        assert_eq!(sum_time_fields(&[]), "");
        assert_eq!(sum_time_fields(&[""]), "");
        assert_eq!(sum_time_fields(&["soon", "1+2+3", "a+4"]), "");
    }

    #[test]
    fn singular_forms_for_one() {
        assert_eq!(sum_time_fields(&["1d", "1 h"]), "1 dzień + 1 godzina");
        assert_eq!(sum_time_fields(&["3 godz"]), "3 godzin");
    }

    #[test]
    fn unit_words_are_case_insensitive() {
        assert_eq!(sum_time_fields(&["2 DNI", "5H"]), "2 dni + 5 godzin");
    }

    #[test]
    fn totals_accumulate_across_expressions() {
        assert_eq!(
            sum_time_fields(&["2 dni 3h", "1+2", "4 godziny"]),
            "3 dni + 9 godzin"
        );
    }

    #[test]
    fn rendering_reparses_to_the_same_total() {
        for inputs in [
            vec!["2 dni", "4h"],
            vec!["1+1"],
            vec!["1 dzień"],
            vec!["7h"],
            vec!["10 dni", "1 h"],
        ] {
            let rendered = sum_time_fields(&inputs);
            assert_eq!(sum_time_fields(&[rendered.as_str()]), rendered);
        }
    }

    #[test]
    fn compact_form_ignored_when_unit_word_present() {
        // "2 dni+4" has a days match, so the bare 4 is not read as hours.
        assert_eq!(sum_time_fields(&["2 dni+4"]), "2 dni");
    }
}

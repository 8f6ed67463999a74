//! Numeric text binding.
//!
//! The `numeric` module converts between the raw integer value backing
//! a payroll field and the grouped-thousands display string shown to
//! the user, and parses free-form user input back into a raw value by
//! stripping every non-digit character.  The display text is always
//! re-derivable from the raw value; the engine never stores a display
//! string that did not come out of a successful parse.
//!
//! Grouping rules are supplied through the [`LocaleNumeric`] trait so
//! the engine itself carries no locale knowledge.  The payroll screens
//! run against a single fixed locale, [`DotSeparated`], which renders
//! one million rupiah as `1.000.000`.

/// Digit-grouping rules for one locale.
///
/// Implementations must be thread-safe (`Send + Sync`) because field
/// bindings constructed from them are shared across service workers.
pub trait LocaleNumeric: Send + Sync {
    /// The separator inserted between groups of three digits.
    fn separator(&self) -> char;

    /// Group an unsigned digit string from the right in threes.
    fn group(&self, digits: &str) -> String {
        group_digits(digits, self.separator())
    }
}

fn group_digits(digits: &str, sep: char) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let offset = digits.len() % 3;
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && (i + 3 - offset) % 3 == 0 {
            out.push(sep);
        }
        out.push(c);
    }
    out
}

/// The rupiah-style grouping used by every payroll screen: a full stop
/// between thousands groups, `1.234.567`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DotSeparated;

impl LocaleNumeric for DotSeparated {
    fn separator(&self) -> char {
        '.'
    }
}

/// How a field renders its digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    /// Grouped thousands; monetary amounts.
    Grouped,
    /// Plain digit run; occurrence and hour counts.
    Plain,
}

/// What a zero raw value renders as.
///
/// Editable fields leave zero blank so "not yet entered" does not read
/// as an explicit zero; read-only bars and totals always render a
/// figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZeroDisplay {
    /// Render zero as the empty string.
    Blank,
    /// Render zero as `"0"`.
    Shown,
}

/// Converts one field's raw value to display text and back.
///
/// A binding is configured once per field (grouping mode, zero policy,
/// locale separator) and then applied on every edit: parse the typed
/// text, store the raw value, re-format, show the canonical text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericBinding {
    grouping: Grouping,
    zero: ZeroDisplay,
    separator: char,
}

impl NumericBinding {
    /// Binding for an editable monetary field: grouped, blank at zero.
    pub fn monetary(locale: &dyn LocaleNumeric) -> Self {
        Self {
            grouping: Grouping::Grouped,
            zero: ZeroDisplay::Blank,
            separator: locale.separator(),
        }
    }

    /// Binding for an editable count field: plain digits, blank at zero.
    pub fn count() -> Self {
        Self {
            grouping: Grouping::Plain,
            zero: ZeroDisplay::Blank,
            separator: '\0',
        }
    }

    /// Binding for a read-only monetary figure that always renders a
    /// value, zero included: top bars, outstanding balances, totals.
    pub fn always_shown(locale: &dyn LocaleNumeric) -> Self {
        Self {
            grouping: Grouping::Grouped,
            zero: ZeroDisplay::Shown,
            separator: locale.separator(),
        }
    }

    /// Format a raw value as display text.
    ///
    /// Zero follows the binding's [`ZeroDisplay`] policy.  Editable
    /// fields can never hold a negative raw value (the parse path does
    /// not produce one), but always-shown figures can: a negative net
    /// pay renders with a leading minus, never clamped.
    pub fn format(&self, raw: i64) -> String {
        if raw == 0 {
            return match self.zero {
                ZeroDisplay::Blank => String::new(),
                ZeroDisplay::Shown => "0".to_string(),
            };
        }
        if raw < 0 {
            return match self.zero {
                ZeroDisplay::Blank => String::new(),
                ZeroDisplay::Shown => format!("-{}", self.render(raw.unsigned_abs())),
            };
        }
        self.render(raw.unsigned_abs())
    }

    /// Parse free-form user text into a raw value.
    ///
    /// Every non-digit character is dropped and the remaining digits
    /// are read as base-10, so `"Rp 1.234.abc"` parses to `1234`.
    /// Empty or digit-free input parses to zero.  There is no way to
    /// enter a negative number through this path.  Accumulation
    /// saturates at `i64::MAX` rather than wrapping.
    pub fn parse(&self, text: &str) -> i64 {
        parse_digits(text)
    }

    fn render(&self, magnitude: u64) -> String {
        let digits = magnitude.to_string();
        match self.grouping {
            Grouping::Plain => digits,
            Grouping::Grouped => group_digits(&digits, self.separator),
        }
    }
}

/// Strip `text` to its digits and read them as a base-10 integer.
///
/// This is the whole parse contract: separators, currency prefixes,
/// alphabetic noise and anything else non-digit vanish before the
/// digits are accumulated.  Saturates at `i64::MAX`.
pub fn parse_digits(text: &str) -> i64 {
    let mut value: i64 = 0;
    for c in text.chars() {
        if let Some(d) = c.to_digit(10) {
            value = value.saturating_mul(10).saturating_add(i64::from(d));
        }
    }
    value
}

/// The uniform monetary ingestion policy.
///
/// External records may carry fractional amounts; internal raw values
/// are whole smallest-denomination units.  Every monetary ingestion
/// site floors through this one helper: fractional parts floor toward
/// negative infinity, then anything below zero (including non-finite
/// input) maps to zero, since raw values are non-negative by contract.
pub fn floor_monetary(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    let floored = value.floor();
    if floored <= 0.0 {
        0
    } else if floored >= i64::MAX as f64 {
        i64::MAX
    } else {
        floored as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monetary() -> NumericBinding {
        NumericBinding::monetary(&DotSeparated)
    }

    #[test]
    fn test_format_groups_thousands_with_dots() {
        let b = monetary();
        assert_eq!(b.format(5_000_000), "5.000.000");
        assert_eq!(b.format(1_234), "1.234");
        assert_eq!(b.format(999), "999");
        assert_eq!(b.format(75_500), "75.500");
    }

    #[test]
    fn test_format_zero_is_blank_for_editable_fields() {
        assert_eq!(monetary().format(0), "");
        assert_eq!(NumericBinding::count().format(0), "");
    }

    #[test]
    fn test_format_zero_is_shown_for_always_shown_fields() {
        let b = NumericBinding::always_shown(&DotSeparated);
        assert_eq!(b.format(0), "0");
    }

    #[test]
    fn test_always_shown_renders_negative_net_pay() {
        let b = NumericBinding::always_shown(&DotSeparated);
        assert_eq!(b.format(-50_000), "-50.000");
        assert_eq!(b.format(-1_234_567), "-1.234.567");
    }

    #[test]
    fn test_count_binding_has_no_grouping() {
        let b = NumericBinding::count();
        assert_eq!(b.format(12345), "12345");
        assert_eq!(b.format(3), "3");
    }

    #[test]
    fn test_parse_strips_every_non_digit() {
        let b = monetary();
        assert_eq!(b.parse("Rp 1.234.abc"), 1_234);
        assert_eq!(b.parse("5.000.000"), 5_000_000);
        assert_eq!(b.parse("  75,500 "), 75_500);
    }

    #[test]
    fn test_parse_digit_free_input_is_zero() {
        let b = monetary();
        assert_eq!(b.parse(""), 0);
        assert_eq!(b.parse("Rp "), 0);
        assert_eq!(b.parse("abc-def"), 0);
    }

    #[test]
    fn test_parse_cannot_produce_a_negative() {
        assert_eq!(parse_digits("-500"), 500);
        assert_eq!(parse_digits("(-1.000)"), 1_000);
    }

    #[test]
    fn test_parse_saturates_instead_of_wrapping() {
        let wide = "9".repeat(40);
        assert_eq!(parse_digits(&wide), i64::MAX);
    }

    #[test]
    fn test_round_trip_parse_of_format() {
        let b = monetary();
        for v in [0, 1, 9, 10, 999, 1_000, 50_000, 5_000_000, 123_456_789] {
            assert_eq!(b.parse(&b.format(v)), v, "round trip failed for {v}");
        }
    }

    #[test]
    fn test_formatting_is_idempotent_through_reparse() {
        let b = monetary();
        for v in [0, 7, 1_500, 2_750_000] {
            let once = b.format(v);
            assert_eq!(b.format(b.parse(&once)), once);
        }
    }

    #[test]
    fn test_floor_monetary_floors_fractions() {
        assert_eq!(floor_monetary(1500.75), 1_500);
        assert_eq!(floor_monetary(1500.0), 1_500);
        assert_eq!(floor_monetary(0.99), 0);
    }

    #[test]
    fn test_floor_monetary_maps_invalid_input_to_zero() {
        assert_eq!(floor_monetary(-25_000.5), 0);
        assert_eq!(floor_monetary(f64::NAN), 0);
        assert_eq!(floor_monetary(f64::INFINITY), 0);
    }

    #[test]
    fn test_locale_group_helper_matches_binding_rendering() {
        let locale = DotSeparated;
        assert_eq!(locale.group("1234567"), "1.234.567");
        assert_eq!(locale.group("12"), "12");
        assert_eq!(locale.group("100"), "100");
    }
}

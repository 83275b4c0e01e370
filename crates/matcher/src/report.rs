//! Tabular output of comparison records.

use std::io::Write;

use crate::types::{ComparisonRecord, MatchError};

/// Column headers of the comparison report, in order.
pub const REPORT_HEADERS: [&str; 4] = ["a", "b", "difference", "similarity score"];

/// Format `value` with `precision` significant digits.
///
/// Fixed notation keeps at least one fractional digit and drops trailing
/// zeros (`1.0`, `0.969`, `0.5`); exponent notation is used below `1e-4` or
/// when the integer part needs all the digits (`1e+02`).
pub fn format_score(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value == 0.0 {
        return "0.0".into();
    }
    let precision = precision.max(1);
    let sci = format!("{:.*e}", precision - 1, value);
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= precision as i32 - 1 {
        let mut mantissa = mantissa.to_string();
        trim_fraction(&mut mantissa);
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exponent.abs());
    }

    let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
    let mut fixed = format!("{value:.decimals$}");
    trim_fraction(&mut fixed);
    if !fixed.contains('.') {
        fixed.push_str(".0");
    }
    fixed
}

/// Drop trailing fractional zeros and a dangling point.
fn trim_fraction(s: &mut String) {
    if !s.contains('.') {
        return;
    }
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
}

/// Write records as tab-separated text with a header row.
///
/// Tokens are rendered with their display form, scores with
/// [`format_score`].
pub fn write_tsv<'a, W, I>(records: I, writer: W, precision: usize) -> Result<(), MatchError>
where
    W: Write,
    I: IntoIterator<Item = &'a ComparisonRecord>,
{
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(writer);
    wtr.write_record(REPORT_HEADERS)?;
    for record in records {
        wtr.write_record([
            record.a.to_string(),
            record.b.to_string(),
            record.difference.to_string(),
            record.similarity_score(precision),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CandidatePair;
    use features::Token;

    #[test]
    fn scores_use_significant_digits() {
        assert_eq!(format_score(1.0, 3), "1.0");
        assert_eq!(format_score(0.96875, 3), "0.969");
        assert_eq!(format_score(0.5, 3), "0.5");
        assert_eq!(format_score(0.25, 3), "0.25");
        assert_eq!(format_score(0.123456, 3), "0.123");
        assert_eq!(format_score(0.0, 3), "0.0");
        assert_eq!(format_score(0.99951, 3), "1.0");
    }

    #[test]
    fn scores_switch_to_exponent_notation() {
        assert_eq!(format_score(0.0000123, 3), "1.23e-05");
        assert_eq!(format_score(100.0, 3), "1e+02");
        assert_eq!(format_score(12.3, 3), "12.3");
    }

    #[test]
    fn precision_is_configurable() {
        assert_eq!(format_score(0.96875, 5), "0.96875");
        assert_eq!(format_score(0.96875, 1), "1e+00");
        assert_eq!(format_score(0.96875, 2), "0.97");
    }

    #[test]
    fn tsv_has_header_and_display_forms() {
        let a = Token::new("eng", "Bat", ["b", "a", "t"]);
        let b = Token::new("eng", "Pat", ["p", "a", "t"]);
        let records = vec![ComparisonRecord::from_pair(CandidatePair::new(a, b, 4), 128)];

        let mut out = Vec::new();
        write_tsv(&records, &mut out, 3).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "a\tb\tdifference\tsimilarity score");
        assert_eq!(lines[1], "(eng) Bat /b a t/\t(eng) Pat /p a t/\t4\t0.969");
        assert_eq!(lines.len(), 2);
    }
}

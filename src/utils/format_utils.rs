//! Stateless decimal formatting helpers for VCF and segment output fields.
//! Fraction digit counts are passed explicitly so no process-wide formatter
//! state is required.

/// Format with a fixed number of fraction digits, e.g. `format_fixed(0.5, 2)`
/// gives "0.50".
pub fn format_fixed(value: f64, fraction_digits: usize) -> String {
    format!("{:.*}", fraction_digits, value)
}

/// Format with at most `fraction_digits` fraction digits, trimming trailing
/// zeros and a trailing decimal point. `format_trimmed(1.0, 2)` gives "1",
/// `format_trimmed(0.5, 2)` gives "0.5".
pub fn format_trimmed(value: f64, fraction_digits: usize) -> String {
    let mut s = format!("{:.*}", fraction_digits, value);
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    // avoid the "-0" rendering of small negative roundings
    if s == "-0" {
        s.truncate(0);
        s.push('0');
    }
    s
}

/// Round to `digits` significant digits and render with trailing zeros
/// trimmed. Used for allele frequencies.
pub fn format_sig_digits(value: f64, digits: i32) -> String {
    if value == 0.0 || !value.is_finite() {
        return String::from("0");
    }
    let magnitude = value.abs().log10().floor() as i32;
    let fraction_digits = (digits - 1 - magnitude).max(0) as usize;
    format_trimmed(value, fraction_digits)
}

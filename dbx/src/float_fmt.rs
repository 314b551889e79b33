//! Canonical decimal text for a float, matching the reference tool's
//! `formatfloat` post-processing over a shortest-round-trip printer.

/// Format `value` the way the DBX XML form expects:
/// - `-.5` becomes `-0.5`
/// - `.5` becomes `0.5`
/// - an integral value with no `e`/`.` gets a trailing `.0`
pub fn format_float(value: f64) -> String {
    let raw = format!("{value}");
    if let Some(rest) = raw.strip_prefix("-.") {
        return format!("-0.{rest}");
    }
    if let Some(rest) = raw.strip_prefix('.') {
        return format!("0.{rest}");
    }
    if !raw.contains('e') && !raw.contains('.') {
        return format!("{raw}.0");
    }
    raw
}

/// Format a 32-bit float through the same rules, widening to `f64` first
/// (Rust's `f32` `Display` is also shortest-round-trip).
pub fn format_float32(value: f32) -> String {
    format_float(f64::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_dot_gets_zero() {
        assert_eq!(format_float(0.5), "0.5");
    }

    #[test]
    fn negative_leading_dot_gets_zero() {
        assert_eq!(format_float(-0.5), "-0.5");
    }

    #[test]
    fn integral_gets_trailing_dot_zero() {
        assert_eq!(format_float(3.0), "3.0");
        assert_eq!(format_float(-3.0), "-3.0");
    }

    #[test]
    fn scientific_notation_left_alone() {
        let s = format_float(1e30);
        assert!(s.contains('e'));
    }

    #[test]
    fn round_trips_through_parse() {
        for value in [0.0f64, -0.0, 1.0, -1.5, 123456.789, 1e-10, f64::MAX] {
            let text = format_float(value);
            let parsed: f64 = text.parse().unwrap();
            assert_eq!(parsed.to_bits(), value.to_bits());
        }
    }

    #[test]
    fn format_float32_matches_f32_roundtrip() {
        let value: f32 = 1.0 / 3.0;
        let text = format_float32(value);
        let parsed: f32 = text.parse().unwrap();
        assert_eq!(parsed, value);
    }
}

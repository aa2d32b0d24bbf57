//! Measurement unit conversions used throughout the container format.
//!
//! The container format measures almost nothing in the same unit twice:
//! spacing and indents come in twentieths of a point (twips), font sizes in
//! half-points, first-line indents sometimes in hundredths of a character,
//! drawing extents in EMUs and line heights in 240ths of a line.

/// EMUs (English Metric Units) per inch.
pub const EMU_PER_INCH: f64 = 914_400.0;

/// Reference screen density for pixel conversions.
pub const PX_PER_INCH: f64 = 96.0;

/// Twips (twentieths of a point) per point.
pub const TWIPS_PER_POINT: f64 = 20.0;

/// Twips per inch (20 twips x 72 points).
pub const TWIPS_PER_INCH: f64 = 1_440.0;

/// Line-spacing units per single line spacing.
pub const LINE_UNITS_PER_LINE: f64 = 240.0;

/// CSS reference: pixels per point (96 dpi / 72 points-per-inch).
pub const PX_PER_POINT: f64 = PX_PER_INCH / 72.0;

/// Convert twips to points.
#[inline]
pub fn twips_to_points(twips: i64) -> f64 {
    twips as f64 / TWIPS_PER_POINT
}

/// Convert half-points (font size unit) to points.
#[inline]
pub fn half_points_to_points(half_points: u32) -> f64 {
    half_points as f64 / 2.0
}

/// Convert hundredths-of-a-character (indent unit) to em.
#[inline]
pub fn char_hundredths_to_em(value: i64) -> f64 {
    value as f64 / 100.0
}

/// Convert EMUs to pixels at 96 DPI, rounded.
#[inline]
pub fn emu_to_px(emu: i64) -> i64 {
    (emu as f64 / EMU_PER_INCH * PX_PER_INCH).round() as i64
}

/// Convert pixels to EMUs at 96 DPI.
#[inline]
pub fn px_to_emu(px: u32) -> i64 {
    (px as f64 / PX_PER_INCH * EMU_PER_INCH).round() as i64
}

/// Convert points to pixels at 96 DPI.
#[inline]
pub fn points_to_px(points: f64) -> f64 {
    points * PX_PER_POINT
}

/// Convert inches to twips.
#[inline]
pub fn inches_to_twips(inches: f64) -> i64 {
    (inches * TWIPS_PER_INCH).round() as i64
}

/// Convert a line-spacing value under the "auto" rule to a unitless
/// multiple (240 = single spacing).
#[inline]
pub fn line_units_to_multiple(value: i64) -> f64 {
    value as f64 / LINE_UNITS_PER_LINE
}

/// Parse a CSS length into pixels.
///
/// Supports `px`, `pt`, `em`, `rem`, `in`, `cm`, `mm` and bare numbers
/// (treated as pixels). Percentages and anything unparseable yield `None`.
///
/// # Examples
///
/// ```
/// use longan::common::units::css_length_to_px;
///
/// assert_eq!(css_length_to_px("96px"), Some(96.0));
/// assert_eq!(css_length_to_px("1in"), Some(96.0));
/// assert!((css_length_to_px("12pt").unwrap() - 16.0).abs() < 0.01);
/// assert_eq!(css_length_to_px("50%"), None);
/// ```
pub fn css_length_to_px(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() || value.ends_with('%') {
        return None;
    }

    let split = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
        .unwrap_or(value.len());
    let (num, unit) = value.split_at(split);
    let num: f64 = num.parse().ok()?;

    let px = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "px" => num,
        "pt" => num * PX_PER_POINT,
        "em" | "rem" => num * 16.0,
        "in" => num * PX_PER_INCH,
        "cm" => num * PX_PER_INCH / 2.54,
        "mm" => num * PX_PER_INCH / 25.4,
        _ => return None,
    };
    Some(px)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twips() {
        assert_eq!(twips_to_points(240), 12.0);
        assert_eq!(inches_to_twips(1.0), 1_440);
        assert_eq!(inches_to_twips(0.5), 720);
    }

    #[test]
    fn test_half_points() {
        assert_eq!(half_points_to_points(28), 14.0);
        assert_eq!(half_points_to_points(21), 10.5);
    }

    #[test]
    fn test_emu_round_trip() {
        // One inch square at 96 DPI
        assert_eq!(emu_to_px(914_400), 96);
        assert_eq!(px_to_emu(96), 914_400);
        // The fixed px -> EMU ratio is 9525
        assert_eq!(px_to_emu(1), 9_525);
    }

    #[test]
    fn test_line_multiple() {
        assert!((line_units_to_multiple(240) - 1.0).abs() < f64::EPSILON);
        assert!((line_units_to_multiple(360) - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_point_px() {
        // 14pt is just short of 19px
        let px = points_to_px(14.0);
        assert!((px - 19.0).abs() <= 1.0);
    }

    #[test]
    fn test_css_lengths() {
        assert_eq!(css_length_to_px("24"), Some(24.0));
        assert_eq!(css_length_to_px("2em"), Some(32.0));
        assert_eq!(css_length_to_px("2.54cm"), Some(96.0));
        assert_eq!(css_length_to_px(""), None);
        assert_eq!(css_length_to_px("auto"), None);
    }
}

//! Color tables and canonicalization.
//!
//! The rich-text model only understands `#RRGGBB`; the inputs speak several
//! dialects (bare hex from container attributes, 3-digit CSS shorthand,
//! `rgb()` functions, CSS color names, fixed highlight names). Everything is
//! normalized here.

use phf::phf_map;

/// Named highlight colors from the container format, mapped to fixed hex
/// values.
pub static HIGHLIGHT_COLORS: phf::Map<&'static str, &'static str> = phf_map! {
    "yellow" => "#FFFF00",
    "green" => "#00FF00",
    "cyan" => "#00FFFF",
    "magenta" => "#FF00FF",
    "blue" => "#0000FF",
    "red" => "#FF0000",
    "darkBlue" => "#00008B",
    "darkCyan" => "#008B8B",
    "darkGreen" => "#006400",
    "darkMagenta" => "#8B008B",
    "darkRed" => "#8B0000",
    "darkYellow" => "#808000",
    "darkGray" => "#A9A9A9",
    "lightGray" => "#D3D3D3",
    "black" => "#000000",
};

/// CSS color names the sanitizer and export composer understand.
pub static NAMED_COLORS: phf::Map<&'static str, &'static str> = phf_map! {
    "red" => "#FF0000",
    "blue" => "#0000FF",
    "green" => "#008000",
    "yellow" => "#FFFF00",
    "black" => "#000000",
    "white" => "#FFFFFF",
    "gray" => "#808080",
    "grey" => "#808080",
    "orange" => "#FFA500",
    "purple" => "#800080",
    "pink" => "#FFC0CB",
    "brown" => "#A52A2A",
    "navy" => "#000080",
    "teal" => "#008080",
    "maroon" => "#800000",
    "olive" => "#808000",
    "aqua" => "#00FFFF",
    "fuchsia" => "#FF00FF",
    "silver" => "#C0C0C0",
    "lime" => "#00FF00",
};

/// Resolve a container highlight name to canonical hex.
pub fn highlight_to_hex(name: &str) -> Option<&'static str> {
    HIGHLIGHT_COLORS.get(name).copied()
}

/// Normalize any supported color spelling to canonical `#RRGGBB`.
///
/// Accepts bare hex (`FF0000`), prefixed hex (`#ff0000`), 3-digit shorthand
/// (`#f00`), `rgb()`/`rgba()` functions and CSS color names. Returns `None`
/// for anything else (including `auto` and `transparent`).
///
/// # Examples
///
/// ```
/// use longan::html::color::normalize_color;
///
/// assert_eq!(normalize_color("ff0000").as_deref(), Some("#FF0000"));
/// assert_eq!(normalize_color("#f00").as_deref(), Some("#FF0000"));
/// assert_eq!(normalize_color("navy").as_deref(), Some("#000080"));
/// assert_eq!(normalize_color("rgb(0, 128, 0)").as_deref(), Some("#008000"));
/// assert_eq!(normalize_color("auto"), None);
/// ```
pub fn normalize_color(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let hex = raw.strip_prefix('#').unwrap_or(raw);
    if hex.len() == 6 && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Some(format!("#{}", hex.to_ascii_uppercase()));
    }
    if hex.len() == 3 && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        let mut out = String::with_capacity(7);
        out.push('#');
        for b in hex.bytes() {
            let c = (b as char).to_ascii_uppercase();
            out.push(c);
            out.push(c);
        }
        return Some(out);
    }

    if let Some(rgb) = parse_rgb_function(raw) {
        return Some(format!("#{:02X}{:02X}{:02X}", rgb[0], rgb[1], rgb[2]));
    }

    NAMED_COLORS
        .get(raw.to_ascii_lowercase().as_str())
        .map(|hex| (*hex).to_string())
}

/// Convert a CSS color to the container's bare `RRGGBB` form.
pub fn css_color_to_docx(raw: &str) -> Option<String> {
    normalize_color(raw).map(|hex| hex[1..].to_string())
}

/// Parse `rgb(r, g, b)` or `rgba(r, g, b, a)`.
fn parse_rgb_function(raw: &str) -> Option<[u8; 3]> {
    let inner = raw
        .strip_prefix("rgba")
        .or_else(|| raw.strip_prefix("rgb"))?
        .trim()
        .strip_prefix('(')?
        .strip_suffix(')')?;

    let mut channels = inner.split(',').map(str::trim);
    let r = channels.next()?.parse::<u8>().ok()?;
    let g = channels.next()?.parse::<u8>().ok()?;
    let b = channels.next()?.parse::<u8>().ok()?;
    Some([r, g, b])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_hex_uppercased() {
        assert_eq!(normalize_color("ab12cd").as_deref(), Some("#AB12CD"));
    }

    #[test]
    fn test_shorthand_expansion() {
        assert_eq!(normalize_color("#abc").as_deref(), Some("#AABBCC"));
    }

    #[test]
    fn test_rgba() {
        assert_eq!(
            normalize_color("rgba(255, 0, 0, 0.5)").as_deref(),
            Some("#FF0000")
        );
    }

    #[test]
    fn test_named() {
        assert_eq!(normalize_color("Teal").as_deref(), Some("#008080"));
        assert_eq!(normalize_color("no-such-color"), None);
    }

    #[test]
    fn test_highlight_palette() {
        assert_eq!(highlight_to_hex("yellow"), Some("#FFFF00"));
        assert_eq!(highlight_to_hex("darkGray"), Some("#A9A9A9"));
        assert_eq!(highlight_to_hex("beige"), None);
    }

    #[test]
    fn test_docx_form() {
        assert_eq!(css_color_to_docx("#2563eb").as_deref(), Some("2563EB"));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(200))]

            /// Arbitrary input never panics and any produced value is
            /// already canonical.
            #[test]
            fn prop_normalize_is_canonical(input in ".{0,24}") {
                if let Some(hex) = normalize_color(&input) {
                    prop_assert_eq!(normalize_color(&hex), Some(hex.clone()));
                    prop_assert_eq!(hex.len(), 7);
                    prop_assert!(hex.starts_with('#'));
                }
            }
        }
    }
}

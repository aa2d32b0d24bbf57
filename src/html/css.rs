//! Inline style declaration helpers.
//!
//! Editor HTML carries its formatting in `style` attributes; these helpers
//! read and rewrite individual declarations without a CSS engine.

/// Split a `style` attribute into `(property, value)` pairs.
///
/// Property names come back lowercased; empty declarations are skipped.
pub fn iter_props(style: &str) -> impl Iterator<Item = (String, String)> + '_ {
    style.split(';').filter_map(|decl| {
        let (name, value) = decl.split_once(':')?;
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim().to_string();
        if name.is_empty() || value.is_empty() {
            return None;
        }
        Some((name, value))
    })
}

/// Get one property's value from a `style` attribute.
pub fn get_prop(style: &str, name: &str) -> Option<String> {
    iter_props(style).find(|(n, _)| n == name).map(|(_, v)| v)
}

/// Remove one property from a `style` attribute, returning the rewritten
/// attribute value.
pub fn remove_prop(style: &str, name: &str) -> String {
    let mut out = String::with_capacity(style.len());
    for (prop, value) in iter_props(style) {
        if prop == name {
            continue;
        }
        if !out.is_empty() {
            out.push_str("; ");
        }
        out.push_str(&prop);
        out.push_str(": ");
        out.push_str(&value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iteration() {
        let props: Vec<_> = iter_props("color: red; Font-Size: 12pt;;").collect();
        assert_eq!(
            props,
            vec![
                ("color".to_string(), "red".to_string()),
                ("font-size".to_string(), "12pt".to_string()),
            ]
        );
    }

    #[test]
    fn test_get() {
        assert_eq!(
            get_prop("color: red; font-size: 12pt", "font-size").as_deref(),
            Some("12pt")
        );
        assert_eq!(get_prop("color: red", "font-size"), None);
    }

    #[test]
    fn test_remove() {
        assert_eq!(
            remove_prop("color: red; font-size: 12pt", "font-size"),
            "color: red"
        );
        assert_eq!(remove_prop("font-size: 12pt", "font-size"), "");
    }
}

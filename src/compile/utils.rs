//! Shared helpers for naming and emission.

use std::collections::HashSet;

/// Whether `name` matches `^[A-Za-z_][A-Za-z0-9_]*$`.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Return `base` if unused, otherwise the first free `base_2`, `base_3`, ...
///
/// The returned name is not inserted into `taken`.
pub fn make_unique_name(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    let mut index = 2;
    loop {
        let candidate = format!("{base}_{index}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        index += 1;
    }
}

/// Lambda parameter name for a nesting depth: `x`, `y`, `z`, then `x3`, `x4`, ...
pub fn lambda_param(depth: usize) -> String {
    match depth {
        0 => "x".to_string(),
        1 => "y".to_string(),
        2 => "z".to_string(),
        n => format!("x{n}"),
    }
}

/// Escape a string for use in a double-quoted JavaScript literal.
pub fn escape_js_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_identifier() {
        assert!(is_valid_identifier("Active"));
        assert!(is_valid_identifier("_internal"));
        assert!(is_valid_identifier("Value2"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("2Fast"));
        assert!(!is_valid_identifier("Not Set"));
        assert!(!is_valid_identifier("naïve"));
    }

    #[test]
    fn test_make_unique_name() {
        let mut taken = HashSet::new();
        assert_eq!(make_unique_name("Item", &taken), "Item");
        taken.insert("Item".to_string());
        assert_eq!(make_unique_name("Item", &taken), "Item_2");
        taken.insert("Item_2".to_string());
        taken.insert("Item_3".to_string());
        assert_eq!(make_unique_name("Item", &taken), "Item_4");
    }

    #[test]
    fn test_lambda_param() {
        assert_eq!(lambda_param(0), "x");
        assert_eq!(lambda_param(2), "z");
        assert_eq!(lambda_param(5), "x5");
    }

    #[test]
    fn test_escape_js_string() {
        assert_eq!(escape_js_string("a\"b"), "a\\\"b");
        assert_eq!(escape_js_string("a\\b"), "a\\\\b");
    }
}

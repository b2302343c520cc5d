pub mod geo;
pub mod time;

pub use geo::*;
pub use time::*;

/// Lowercases a name for substring search. Applied both to stored names and to
/// the search needle so matching is case-insensitive beyond ASCII.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Lowercases the needle and escapes `LIKE` wildcards so it matches literally.
/// Surrounding whitespace is kept. Pair with `ESCAPE '\'` in the query.
pub fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[test]
fn normalize_test() {
    assert_eq!(normalize("  Gare de LYON "), "gare de lyon");
    assert_eq!(normalize("ÉCOLE"), "école");
}

#[test]
fn like_pattern_test() {
    assert_eq!(like_pattern("Gare"), "%gare%");
    assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    assert_eq!(like_pattern(" Parc"), "% parc%");
    assert_eq!(like_pattern(""), "%%");
}

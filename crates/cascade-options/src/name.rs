//! Option name normalization and the key spellings sources look for.

/// Prefixes that spell a negated boolean option, in lookup order.
pub const NEGATIONS: [&str; 3] = ["no", "not", "non"];

/// Canonical form of an option name: lowercase, `-` and `_` read as spaces,
/// runs of whitespace collapsed to a single space.
pub fn canonical(name: &str) -> String {
    name.to_lowercase()
        .replace(|c: char| c == '-' || c == '_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// The names a boolean option answers to: itself, then each negated form.
///
/// The first element is the plain name; the rest invert the parsed value.
pub fn boolean_forms(name: &str) -> [String; 4] {
    [
        name.to_string(),
        format!("{} {}", NEGATIONS[0], name),
        format!("{} {}", NEGATIONS[1], name),
        format!("{} {}", NEGATIONS[2], name),
    ]
}

/// Key spellings tried by the property file source, in order.
///
/// `first name` yields `FIRST_NAME`, `first_name`, `first-name`,
/// `first.name` and finally `first name`.
pub fn property_keys(name: &str) -> [String; 5] {
    [
        name.to_uppercase().replace(' ', "_"),
        name.replace(' ', "_"),
        name.replace(' ', "-"),
        name.replace(' ', "."),
        name.to_string(),
    ]
}

/// Environment key for an option: `<prefix><sep><UPPER_NAME>`, with words
/// joined by `sep`. An empty prefix drops the leading separator.
pub fn environment_key(prefix: &str, sep: &str, name: &str) -> String {
    let upper = name.to_uppercase().replace(' ', sep);
    if prefix.is_empty() {
        upper
    } else {
        format!("{prefix}{sep}{upper}")
    }
}

//! URL slug for module names: "  My Module " -> "my-module".

/// Trim, lowercase, and join whitespace-separated words with a single `-`.
/// Applying it to its own output returns the same string.
pub fn to_slug(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    lower.split_whitespace().collect::<Vec<_>>().join("-")
}

/// Base route for an already slugged module name: `/api/{slug}/v1`.
pub fn base_path(slug: &str) -> String {
    format!("/api/{}/v1", slug)
}

//! Name synthesis for generated path segments.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

static NON_SLUG_RUN: OnceLock<Regex> = OnceLock::new();

/// Synthesize a node name not present in `existing`.
///
/// Names are `{prefix}{16 hex chars}` drawn at random; a candidate that
/// collides with a current sibling is redrawn.
pub fn generate_auto_name(existing: &[String], prefix: Option<&str>) -> String {
    let used: HashSet<&str> = existing.iter().map(String::as_str).collect();
    let prefix = prefix.unwrap_or("");
    loop {
        let bytes: [u8; 8] = rand::random();
        let candidate = format!("{prefix}{}", hex::encode(bytes));
        if !used.contains(candidate.as_str()) {
            return candidate;
        }
    }
}

/// Default slugifier: lowercase, collapse every run of characters outside
/// `[a-z0-9]` into a single `-`, trim leading and trailing `-`.
///
/// ```
/// use nodemap_id::slugify;
///
/// assert_eq!(slugify("Hello, World!"), "hello-world");
/// ```
pub fn slugify(input: &str) -> String {
    let regex = NON_SLUG_RUN.get_or_init(|| Regex::new(r"[^a-z0-9]+").unwrap());
    let lowered = input.to_lowercase();
    regex.replace_all(&lowered, "-").trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn auto_name_uses_prefix() {
        let name = generate_auto_name(&[], Some("item-"));
        assert!(name.starts_with("item-"));
        assert_eq!(name.len(), "item-".len() + 16);
    }

    #[test]
    fn auto_names_do_not_repeat() {
        let mut seen: Vec<String> = Vec::new();
        for _ in 0..500 {
            let name = generate_auto_name(&seen, None);
            assert!(!seen.contains(&name));
            seen.push(name);
        }
    }

    #[test]
    fn slugify_examples() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  --Rust & Nodes--  "), "rust-nodes");
        assert_eq!(slugify("already-slugged"), "already-slugged");
        assert_eq!(slugify("!!!"), "");
    }

    proptest! {
        #[test]
        fn slug_is_path_safe(input in ".{0,40}") {
            let slug = slugify(&input);
            prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
            prop_assert!(!slug.starts_with('-') && !slug.ends_with('-'));
            prop_assert!(!slug.contains("--"));
        }
    }
}

use once_cell::sync::Lazy;
use regex::Regex;

static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-/]").expect("separators regex"));
static DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^_\p{L}\p{N}\s]").expect("disallowed characters regex"));
static RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[_\s]+").expect("underscore runs regex"));

pub fn slugify(title: &str) -> String {
    // replace separators into underscores
    let title = SEPARATORS.replace_all(title.trim(), "_");

    // drop everything except underscores, letters, numbers and whitespace
    let title = DISALLOWED.replace_all(&title, "");

    let title = RUNS.replace_all(&title, "_");

    title.trim_matches('_').to_lowercase()
}

/// Letters (any script), numbers and underscores only.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c == '_' || c.is_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_lowercases_and_joins_words() {
        assert_eq!(slugify("Leo Tolstoy Fans"), "leo_tolstoy_fans");
        assert_eq!(slugify("  cats / dogs - birds "), "cats_dogs_birds");
        assert_eq!(slugify("What's new?!"), "whats_new");
    }

    #[test]
    fn slugify_keeps_unicode_letters() {
        assert_eq!(slugify("Лев Толстой"), "лев_толстой");
    }

    #[test]
    fn slugify_of_punctuation_is_empty() {
        assert_eq!(slugify("?!."), "");
        assert!(!is_valid_slug(&slugify("?!.")));
    }

    #[test]
    fn valid_slugs() {
        assert!(is_valid_slug("leo_fans"));
        assert!(is_valid_slug("лев"));
        assert!(!is_valid_slug("with space"));
        assert!(!is_valid_slug("slash/ed"));
    }
}

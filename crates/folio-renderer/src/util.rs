//! Shared rendering helpers.

use std::collections::HashMap;

/// Convert heading text to an anchor slug.
///
/// Lowercases, keeps alphanumerics, and collapses runs of anything else
/// into single hyphens.
pub(crate) fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Deduplicate a slug against previously used ids.
///
/// The first occurrence keeps the plain slug; later ones get `-1`, `-2`
/// suffixes. Generated ids are recorded too, so a literal heading like
/// `FAQ-1` can never collide with a suffixed duplicate of `FAQ`.
pub(crate) fn unique_id(slug: String, used: &mut HashMap<String, usize>) -> String {
    if !used.contains_key(&slug) {
        used.insert(slug.clone(), 1);
        return slug;
    }

    let mut count = used.get(&slug).copied().unwrap_or(1);
    loop {
        let candidate = format!("{slug}-{count}");
        count += 1;
        if !used.contains_key(&candidate) {
            used.insert(slug, count);
            used.insert(candidate.clone(), 1);
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Section Title"), "section-title");
    }

    #[test]
    fn test_slugify_punctuation_collapsed() {
        assert_eq!(slugify("What, me worry?"), "what-me-worry");
        assert_eq!(slugify("  leading & trailing  "), "leading-trailing");
    }

    #[test]
    fn test_unique_id_suffixes() {
        let mut used = HashMap::new();
        assert_eq!(unique_id("faq".to_owned(), &mut used), "faq");
        assert_eq!(unique_id("faq".to_owned(), &mut used), "faq-1");
        assert_eq!(unique_id("faq".to_owned(), &mut used), "faq-2");
    }

    #[test]
    fn test_unique_id_literal_matching_suffixed() {
        let mut used = HashMap::new();
        assert_eq!(unique_id("faq".to_owned(), &mut used), "faq");
        assert_eq!(unique_id("faq".to_owned(), &mut used), "faq-1");
        // A literal "faq-1" slug must not reuse the generated id.
        assert_eq!(unique_id("faq-1".to_owned(), &mut used), "faq-1-1");
    }

    #[test]
    fn test_unique_id_suffix_skips_taken_literal() {
        let mut used = HashMap::new();
        assert_eq!(unique_id("faq-1".to_owned(), &mut used), "faq-1");
        assert_eq!(unique_id("faq".to_owned(), &mut used), "faq");
        // "faq-1" is taken by the literal, so the duplicate steps past it.
        assert_eq!(unique_id("faq".to_owned(), &mut used), "faq-2");
    }
}

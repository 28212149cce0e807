// Slug generation: lowercase hyphenated slugs with random suffixes for
// collision avoidance.

use proptest::prelude::*;

use medikart::catalog::services::slug::{slug_with_suffix, slugify};

proptest! {
    #[test]
    fn test_slug_alphabet(name in ".{0,64}") {
        let slug = slugify(&name);
        prop_assert!(
            slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'),
            "slug '{}' contains characters outside [a-z0-9-]",
            slug
        );
    }

    #[test]
    fn test_slug_has_no_edge_hyphens(name in ".{0,64}") {
        let slug = slugify(&name);
        prop_assert!(!slug.starts_with('-'));
        prop_assert!(!slug.ends_with('-'));
    }

    #[test]
    fn test_slug_is_idempotent(name in "[a-zA-Z0-9 ]{1,40}") {
        let once = slugify(&name);
        prop_assert_eq!(slugify(&once), once.clone());
    }
}

#[test]
fn test_known_names() {
    assert_eq!(slugify("Napa Extra 500mg"), "napa-extra-500mg");
    assert_eq!(slugify("Square Pharmaceuticals Ltd."), "square-pharmaceuticals-ltd");
    assert_eq!(slugify("  Oral & Dental Care  "), "oral-dental-care");
}

#[test]
fn test_suffixed_slugs_differ() {
    let a = slug_with_suffix("napa-500");
    let b = slug_with_suffix("napa-500");
    assert!(a.starts_with("napa-500-"));
    assert!(b.starts_with("napa-500-"));
    assert_ne!(a, b);
}

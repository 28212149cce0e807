use rand::Rng;

/// Lowercase, hyphen-separated slug from a display name.
///
/// Non-alphanumeric runs collapse to single hyphens; leading and trailing
/// hyphens are stripped.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_hyphen = true; // suppress a leading hyphen

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    slug
}

/// Collision-avoiding variant: the base slug plus a 6-hex-char random suffix
pub fn slug_with_suffix(base: &str) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..0x1000000);
    format!("{}-{:06x}", base, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Napa Extra 500mg"), "napa-extra-500mg");
        assert_eq!(slugify("Seclo 20"), "seclo-20");
    }

    #[test]
    fn test_slugify_collapses_punctuation() {
        assert_eq!(slugify("A+B  (C)"), "a-b-c");
        assert_eq!(slugify("--edge--"), "edge");
    }

    #[test]
    fn test_slugify_empty_and_symbol_only() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_suffix_extends_base() {
        let suffixed = slug_with_suffix("napa-500");
        assert!(suffixed.starts_with("napa-500-"));
        assert_eq!(suffixed.len(), "napa-500-".len() + 6);
        assert!(suffixed
            .rsplit('-')
            .next()
            .unwrap()
            .chars()
            .all(|c| c.is_ascii_hexdigit()));
    }
}

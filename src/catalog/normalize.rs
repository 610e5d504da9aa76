//! Pure string-shape helpers used while normalising a [`ModelInput`] into a
//! [`Model`] (spec §4.1).

use rand::Rng;

/// `consonant+y -> ...ies`; `s/ch/sh/ex -> ...es`; else `...s` (spec §4.1).
pub fn pluralize(slug: &str) -> String {
    let lower = slug;
    if let Some(stem) = lower.strip_suffix('y') {
        if let Some(before_y) = stem.chars().last() {
            if !"aeiou".contains(before_y) {
                return format!("{stem}ies");
            }
        }
    }
    if lower.ends_with('s')
        || lower.ends_with("ch")
        || lower.ends_with("sh")
        || lower.ends_with("ex")
    {
        return format!("{lower}es");
    }
    format!("{lower}s")
}

/// `snake_case` of an already-pluralised slug (camelCase or snake_case in
/// -> snake_case out).
pub fn snake_case(slug: &str) -> String {
    let mut out = String::with_capacity(slug.len() + 4);
    for (i, c) in slug.chars().enumerate() {
        if c == '.' {
            out.push('_');
        } else if c.is_uppercase() {
            if i != 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// De-camelise a slug into space-separated Title Case words, e.g.
/// `blogPost` -> `Blog Post`.
pub fn title_case(slug: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    for c in slug.chars() {
        if c == '_' || c == '-' || c == '.' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        } else if c.is_uppercase() && !current.is_empty() {
            words.push(std::mem::take(&mut current));
            current.push(c);
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .into_iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// First 3 chars of the slug, lowercased.
pub fn id_prefix(slug: &str) -> String {
    slug.chars().take(3).collect::<String>().to_lowercase()
}

/// A random model id: `mod_` followed by 16 lowercase hex chars derived
/// from 12 random bytes (spec §4.1 step 1).
pub fn generate_model_id() -> String {
    let mut rng = rand::rng();
    let mut bytes = [0u8; 12];
    rng.fill(&mut bytes);
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!("mod_{}", &hex[..16])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pluralize_consonant_y() {
        assert_eq!(pluralize("category"), "categories");
    }

    #[test]
    fn pluralize_vowel_y() {
        assert_eq!(pluralize("day"), "days");
    }

    #[test]
    fn pluralize_s_suffix() {
        assert_eq!(pluralize("address"), "addresses");
    }

    #[test]
    fn pluralize_ch_suffix() {
        assert_eq!(pluralize("batch"), "batches");
    }

    #[test]
    fn pluralize_default() {
        assert_eq!(pluralize("account"), "accounts");
    }

    #[test]
    fn snake_case_from_camel() {
        assert_eq!(snake_case("blogPosts"), "blog_posts");
    }

    #[test]
    fn title_case_from_camel() {
        assert_eq!(title_case("blogPost"), "Blog Post");
    }

    #[test]
    fn id_prefix_truncates_and_lowercases() {
        assert_eq!(id_prefix("Account"), "acc");
    }

    #[test]
    fn model_id_has_expected_shape() {
        let id = generate_model_id();
        assert!(id.starts_with("mod_"));
        assert_eq!(id.len(), 4 + 16);
        assert!(id[4..].chars().all(|c| c.is_ascii_hexdigit()));
    }
}

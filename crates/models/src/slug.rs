use crate::validation::ValidationError;

/// Maximum slug length accepted by the schema
pub const MAX_SLUG_LEN: usize = 200;

/// Converts a title into a URL slug.
///
/// Letters and digits are lowercased, runs of whitespace, hyphens and
/// underscores become a single hyphen, everything else is dropped.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_dash = true;
        }
    }

    slug.truncate(MAX_SLUG_LEN);
    slug.trim_end_matches('-').to_owned()
}

/// Uses the explicit slug when given, otherwise derives one from `source`
pub fn resolve_slug(explicit: Option<&str>, source: &str) -> Result<String, ValidationError> {
    let slug = match explicit {
        Some(slug) => slugify(slug),
        None => slugify(source),
    };

    if slug.is_empty() {
        return Err(ValidationError::new(
            "slug",
            "must contain at least one letter or digit",
        ));
    }
    Ok(slug)
}

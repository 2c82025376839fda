//! Artifact naming.
//!
//! Base names look like `2026-03-04_050607_a-rocket_v2`: timestamp first so
//! a plain lexicographic sort is a sort by generation time.

use chrono::{DateTime, Utc};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H%M%S";
pub const MAX_SLUG_LEN: usize = 40;
const EMPTY_SLUG: &str = "icon";

/// Deterministic base name for one variant. No extension.
pub fn base_name(timestamp: DateTime<Utc>, description: &str, variant_index: u32) -> String {
    format!(
        "{}_{}_v{}",
        timestamp.format(TIMESTAMP_FORMAT),
        slugify(description),
        variant_index
    )
}

/// Name to use when `base` is already taken. `attempt` starts at 2.
pub fn disambiguate(base: &str, attempt: u32) -> String {
    format!("{base}-{attempt}")
}

/// Lower-case ASCII slug; anything else collapses into single dashes.
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
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        EMPTY_SLUG.to_string()
    } else {
        slug.to_string()
    }
}

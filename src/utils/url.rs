// src/utils/url.rs

//! URL identity utilities.
//!
//! Two URLs point at the same post iff their [`normalize`] keys are equal.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Matches a `cafe.<domain>` or `blog.<domain>` host anywhere in a URL.
static CAFE_OR_BLOG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[/.])(?:cafe|blog)\.[a-z0-9-]+\.[a-z]").expect("static regex")
});

/// Canonicalize a URL into its comparison key: `host + path`.
///
/// Drops the query string, any `=token` suffix on cafe/blog URLs, the scheme,
/// the fragment and a single leading `m.` on the host. Input that cannot be
/// parsed comes back as-is (minus its query), so it only ever matches itself.
///
/// # Examples
/// ```
/// use exposure_monitor::utils::url::normalize;
///
/// assert_eq!(
///     normalize("https://m.cafe.example.com/club/12?art=abc"),
///     "cafe.example.com/club/12"
/// );
/// assert_eq!(normalize(""), "");
/// ```
pub fn normalize(url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }

    let mut stripped = url.split('?').next().unwrap_or(url);
    if CAFE_OR_BLOG.is_match(stripped) {
        if let Some(idx) = stripped.find('=') {
            stripped = &stripped[..idx];
        }
    }

    let Ok(parsed) = Url::parse(stripped.trim()) else {
        return stripped.to_string();
    };
    let Some(host) = parsed.host_str() else {
        return stripped.to_string();
    };

    let host = host.strip_prefix("m.").unwrap_or(host);
    format!("{}{}", host, parsed.path())
}

/// 1-based rank of `target` within `results`, compared by normalized key.
pub fn find_position(target: &str, results: &[String]) -> Option<usize> {
    let key = normalize(target);
    if key.is_empty() {
        return None;
    }
    results
        .iter()
        .position(|u| normalize(u) == key)
        .map(|idx| idx + 1)
}

/// Extract the cafe id (first path segment) from a cafe URL.
pub fn cafe_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    if !host.trim_start_matches("m.").starts_with("cafe.") {
        return None;
    }
    parsed
        .path_segments()?
        .find(|segment| !segment.is_empty())
        .map(|segment| segment.to_string())
}

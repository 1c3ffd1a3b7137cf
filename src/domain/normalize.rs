//! Text and URL normalization applied while converting wire records to drafts.

/// Lowercases and collapses runs of whitespace to single spaces.
pub fn normalize_title(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Minimal, dependency-free host extraction.
pub fn host_of(url: &str) -> Option<String> {
    let u = url.trim();
    let after_scheme = u.split("://").nth(1)?;
    let host_port = after_scheme.split('/').next()?;
    let host = host_port.split('@').last().unwrap_or(host_port);
    let host = host.split(':').next().unwrap_or(host);
    if host.is_empty() {
        None
    } else {
        Some(host.to_ascii_lowercase())
    }
}

/// The listing exposes permalinks as site-relative paths; canonicalize them.
pub fn absolute_permalink(path_or_url: &str) -> String {
    if path_or_url.starts_with("http://") || path_or_url.starts_with("https://") {
        path_or_url.to_string()
    } else {
        format!("https://www.reddit.com{path_or_url}")
    }
}

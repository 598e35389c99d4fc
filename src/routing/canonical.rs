//! Canonical path policy.
//!
//! A canonical path is rooted, lexically clean (no `.` or `..` segments, no
//! repeated separators) and always ends with a separator. Requests for any
//! other spelling are redirected to the canonical one.

/// Normalize `path` and report whether it was already canonical.
///
/// Total over all inputs: the empty string canonicalizes to `"/"` and a
/// relative path is rooted before cleaning. The returned path is always a
/// fixed point, so `canonicalize(&canonicalize(p).0).0 == canonicalize(p).0`.
pub fn canonicalize(path: &str) -> (String, bool) {
    if path.is_empty() {
        return ("/".to_string(), false);
    }

    if !path.starts_with('/') {
        let (cleaned, _) = canonicalize(&format!("/{path}"));
        return (cleaned, false);
    }

    let mut canonical = clean(path);
    if !canonical.ends_with('/') {
        canonical.push('/');
    }

    let is_canonical = canonical == path;
    (canonical, is_canonical)
}

/// Lexically clean a rooted path.
///
/// `..` at the root stays at the root. The result never carries a trailing
/// separator unless it is the root itself.
fn clean(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    let mut cleaned = String::with_capacity(path.len());
    for segment in &segments {
        cleaned.push('/');
        cleaned.push_str(segment);
    }

    if cleaned.is_empty() {
        cleaned.push('/');
    }
    cleaned
}

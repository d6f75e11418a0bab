//! Canonical path helpers for the remote share tree.
//!
//! Every path held in engine state is canonical: forward-slash separated,
//! no leading or trailing separator, no empty segments. The empty string is
//! the share root. All functions here are pure and total; feeding a
//! canonical path back in is always a no-op.

/// Canonicalize a raw path: convert backslashes, strip leading/trailing
/// separators, collapse runs of separators.
///
/// Idempotent: `normalize(normalize(p)) == normalize(p)`.
pub fn normalize(raw: &str) -> String {
    raw.trim()
        .replace('\\', "/")
        .split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Parent of a canonical path. The root is its own parent.
pub fn parent(path: &str) -> String {
    let normalized = normalize(path);
    match normalized.rfind('/') {
        Some(pos) => normalized[..pos].to_string(),
        None => String::new(),
    }
}

/// Join a base path and a child name into a canonical path.
pub fn join(base: &str, name: &str) -> String {
    let base = normalize(base);
    if base.is_empty() {
        normalize(name)
    } else {
        normalize(&format!("{}/{}", base, name))
    }
}

/// Path segments, in order, with no empty entries.
pub fn segments(path: &str) -> Vec<String> {
    normalize(path)
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Last segment of a path, or `""` for the root.
pub fn file_name(path: &str) -> String {
    let normalized = normalize(path);
    match normalized.rfind('/') {
        Some(pos) => normalized[pos + 1..].to_string(),
        None => normalized,
    }
}

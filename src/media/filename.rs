//! Download filename handling.
//!
//! Client-supplied names end up inside a `Content-Disposition` header, so
//! everything outside `[A-Za-z0-9_-]` is squashed before use.

use url::Url;

/// Used when neither the client nor the URL provides a usable name.
pub const FALLBACK_STEM: &str = "media";

/// Used when no extension can be recovered.
pub const FALLBACK_EXTENSION: &str = "mp4";

/// Replace every run of disallowed characters with a single `-` and trim
/// hyphens from both ends.
pub fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

/// Split at the last `.`, ignoring a leading dot.
fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => (&name[..idx], Some(&name[idx + 1..])),
        _ => (name, None),
    }
}

/// Sanitized `(stem, extension)` of a raw name. Empty parts become `None`.
fn sanitized_parts(name: &str) -> (Option<String>, Option<String>) {
    let (stem, ext) = split_extension(name);
    let stem = Some(sanitize(stem)).filter(|s| !s.is_empty());
    let ext = ext.map(sanitize).filter(|s| !s.is_empty());
    (stem, ext)
}

/// Last path segment of the URL, or an empty string.
pub fn url_basename(url: &Url) -> &str {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("")
}

/// Derive the attachment filename for a download.
///
/// The stem comes from the client name when it survives sanitizing, else
/// from the URL basename, else [`FALLBACK_STEM`]. The extension prefers the
/// chosen name's, then the URL basename's, then [`FALLBACK_EXTENSION`].
pub fn attachment_filename(requested: Option<&str>, url: &Url) -> String {
    let (url_stem, url_ext) = sanitized_parts(url_basename(url));

    let (stem, ext) = match requested.map(sanitized_parts) {
        Some((Some(stem), ext)) => (stem, ext),
        _ => (
            url_stem.unwrap_or_else(|| FALLBACK_STEM.to_string()),
            url_ext.clone(),
        ),
    };

    let ext = ext
        .or(url_ext)
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string());

    format!("{}.{}", stem, ext)
}

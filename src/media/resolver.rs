//! Media URL resolution.
//!
//! Hook for per-provider URL rewriting before the upstream fetch. Every URL
//! currently resolves to itself.

use url::Url;

/// Endpoints that multiplex several media tracks and must never be rewritten.
const PASSTHROUGH_SUFFIXES: &[&str] = &["/render.php"];

/// Resolve the URL that will actually be fetched upstream.
///
/// Unparseable input is returned unchanged.
pub fn resolve_media_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(parsed) if !is_passthrough(&parsed) => {
            rewrite(&parsed).unwrap_or_else(|| raw.to_string())
        }
        _ => raw.to_string(),
    }
}

fn is_passthrough(url: &Url) -> bool {
    PASSTHROUGH_SUFFIXES
        .iter()
        .any(|suffix| url.path().ends_with(suffix))
}

/// Provider-specific rewrite. No provider needs one yet.
fn rewrite(_url: &Url) -> Option<String> {
    None
}

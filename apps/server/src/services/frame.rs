//! Frame location and URL normalization.
//!
//! An action either targets the top page or an iframe recorded by its `src`.
//! Iframe URLs drift between recording and replay (session ids, row ids), so
//! matching compares origin plus a normalized path with id-like segments
//! removed.

use once_cell::sync::Lazy;
use playwright::api::{Frame, Page};
use regex::Regex;
use std::time::{Duration, Instant};
use url::Url;

use crate::error::{AppError, AppResult};
use crate::models::Action;

const FRAME_POLL_INTERVAL: Duration = Duration::from_millis(500);
const FRAME_LOCATE_TIMEOUT: Duration = Duration::from_secs(30);

/// Canonical UUID shape: 8-4-4-4-12 hex groups.
static UUID_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("valid uuid segment regex")
});

/// Resolve the frame an action targets: the top frame, or the first child
/// frame whose URL shares origin and normalized path with the recorded src.
/// Polls the frame set because iframes attach asynchronously after navigation.
pub async fn frame_for(page: &Page, action: &Action) -> AppResult<Frame> {
    if action.targets_top_frame() {
        return Ok(page.main_frame());
    }

    // targets_top_frame() guarantees a recorded src beyond this point
    let src = action
        .iframe_identifier
        .as_ref()
        .and_then(|i| i.src.as_deref())
        .unwrap_or_default();

    let deadline = Instant::now() + FRAME_LOCATE_TIMEOUT;
    loop {
        let frames = page.frames().map_err(AppError::browser)?;
        for frame in frames {
            if let Ok(frame_url) = frame.url() {
                if frame_matches(&frame_url, src) {
                    return Ok(frame);
                }
            }
        }

        if Instant::now() >= deadline {
            return Err(AppError::Resolution(format!(
                "Iframe matching '{src}' not found within {}s",
                FRAME_LOCATE_TIMEOUT.as_secs()
            )));
        }
        tokio::time::sleep(FRAME_POLL_INTERVAL).await;
    }
}

/// Whether a live frame URL corresponds to the recorded iframe src: same
/// origin and equal normalized path.
pub fn frame_matches(frame_url: &str, recorded_src: &str) -> bool {
    let (Ok(live), Ok(recorded)) = (Url::parse(frame_url), Url::parse(recorded_src)) else {
        return false;
    };

    let same_origin = live.scheme() == recorded.scheme()
        && live.host_str() == recorded.host_str()
        && live.port_or_known_default() == recorded.port_or_known_default();

    same_origin && normalize_path(live.path()) == normalize_path(recorded.path())
}

/// Split a path on `/`, dropping empty segments and id-like segments
/// (all-digit or UUID-shaped), so `/orders/123/edit` and `/orders/987/edit`
/// normalize identically.
pub fn normalize_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|segment| !segment.is_empty() && !is_id_like(segment))
        .map(str::to_string)
        .collect()
}

fn is_id_like(segment: &str) -> bool {
    segment.chars().all(|c| c.is_ascii_digit()) || UUID_SEGMENT.is_match(segment)
}

/// Strip a single trailing slash from a non-root path. Idempotent; used by
/// the observational `navigate` action for URL comparison.
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.len() > 1 && trimmed.ends_with('/') && !trimmed.ends_with("//") {
        // Keep the root slash of an origin-only URL like https://example.org/
        if let Ok(parsed) = Url::parse(trimmed) {
            if parsed.path() == "/" {
                return trimmed.to_string();
            }
        }
        return trimmed[..trimmed.len() - 1].to_string();
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_like_segments_are_dropped() {
        assert_eq!(
            normalize_path("/orders/123/edit"),
            vec!["orders".to_string(), "edit".to_string()]
        );
        assert_eq!(
            normalize_path("/a/550e8400-e29b-41d4-a716-446655440000/b"),
            vec!["a".to_string(), "b".to_string()]
        );
        assert_eq!(normalize_path("//double//slashes"), vec!["double", "slashes"]);
    }

    #[test]
    fn non_id_segments_survive() {
        assert_eq!(
            normalize_path("/v2/users1/list"),
            vec!["v2", "users1", "list"]
        );
    }

    #[test]
    fn frame_match_requires_same_origin() {
        assert!(frame_matches(
            "https://pay.example.org/checkout/42/form",
            "https://pay.example.org/checkout/7/form"
        ));
        assert!(!frame_matches(
            "https://evil.example.net/checkout/42/form",
            "https://pay.example.org/checkout/7/form"
        ));
        assert!(!frame_matches(
            "http://pay.example.org/checkout/form",
            "https://pay.example.org/checkout/form"
        ));
    }

    #[test]
    fn frame_match_requires_equal_normalized_path() {
        assert!(!frame_matches(
            "https://pay.example.org/checkout/form",
            "https://pay.example.org/refund/form"
        ));
    }

    #[test]
    fn unparsable_urls_never_match() {
        assert!(!frame_matches("not a url", "https://example.org/"));
    }

    #[test]
    fn normalize_url_strips_single_trailing_slash() {
        assert_eq!(
            normalize_url("https://example.org/path/"),
            "https://example.org/path"
        );
        assert_eq!(
            normalize_url("https://example.org/path"),
            "https://example.org/path"
        );
    }

    #[test]
    fn normalize_url_keeps_root_slash() {
        assert_eq!(normalize_url("https://example.org/"), "https://example.org/");
    }

    #[test]
    fn normalize_url_is_idempotent() {
        let once = normalize_url("https://example.org/a/b/");
        assert_eq!(normalize_url(&once), once);
    }
}

//! Element resolution against a frame.
//!
//! Resolution policy: the recorder's `uniqueSelector` is always tried first,
//! then each xpath candidate in authored order. Presence is enough here;
//! clickability (visibility) is a separate, stricter check used by mouse
//! actions.

use playwright::api::{ElementHandle, Frame};
use std::time::{Duration, Instant};

use crate::error::{AppError, AppResult};
use crate::models::ElementDescriptor;

/// Default per-candidate wait when resolving an element.
pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(3);
/// Overall deadline for the clickability scan.
pub const CLICKABLE_TIMEOUT: Duration = Duration::from_secs(10);
/// Per-candidate presence wait inside the clickability scan.
const CANDIDATE_PRESENCE_TIMEOUT: Duration = Duration::from_secs(3);
/// Settle delay after scrolling an element into view.
const SCROLL_SETTLE: Duration = Duration::from_millis(300);

/// A resolved element: the selector that matched plus its handle.
pub struct ResolvedElement {
    pub selector: String,
    pub handle: ElementHandle,
}

/// Prefix an xpath expression so Playwright treats it as one.
pub fn xpath_selector(xpath: &str) -> String {
    if xpath.starts_with("xpath=") {
        xpath.to_string()
    } else {
        format!("xpath={xpath}")
    }
}

async fn wait_for(frame: &Frame, selector: &str, timeout: Duration) -> Option<ElementHandle> {
    frame
        .wait_for_selector_builder(selector)
        .timeout(timeout.as_millis() as f64)
        .wait_for_selector()
        .await
        .ok()
        .flatten()
}

/// Resolve an element descriptor within a frame.
///
/// Tries `uniqueSelector` with the given timeout, then each xpath candidate
/// in order; the first selector that resolves wins.
pub async fn resolve(
    frame: &Frame,
    descriptor: &ElementDescriptor,
    timeout: Duration,
) -> AppResult<ResolvedElement> {
    if let Some(selector) = &descriptor.unique_selector {
        if let Some(handle) = wait_for(frame, selector, timeout).await {
            return Ok(ResolvedElement {
                selector: selector.clone(),
                handle,
            });
        }
    }

    for xpath in descriptor.xpaths() {
        let selector = xpath_selector(xpath);
        if let Some(handle) = wait_for(frame, &selector, timeout).await {
            return Ok(ResolvedElement { selector, handle });
        }
    }

    Err(AppError::Resolution(format!(
        "Element not found: selector={:?} xpath candidates={}",
        descriptor.unique_selector,
        descriptor.xpaths().len()
    )))
}

/// Find the first xpath candidate that is present and visible
/// (`offsetParent !== null`). Returns its selector.
pub async fn ensure_clickable(
    frame: &Frame,
    xpaths: &[&str],
    timeout: Duration,
) -> AppResult<String> {
    let deadline = Instant::now() + timeout;

    for xpath in xpaths {
        if Instant::now() >= deadline {
            break;
        }

        let selector = xpath_selector(xpath);
        if wait_for(frame, &selector, CANDIDATE_PRESENCE_TIMEOUT)
            .await
            .is_none()
        {
            continue;
        }

        let visible: bool = frame
            .evaluate_on_selector(&selector, "el => el.offsetParent !== null", None::<()>)
            .await
            .unwrap_or(false);
        if visible {
            return Ok(selector);
        }
    }

    Err(AppError::Resolution(format!(
        "No visible element among {} xpath candidate(s)",
        xpaths.len()
    )))
}

/// Center the element in the viewport. Non-blocking: scroll errors are
/// swallowed, and a short settle delay follows.
pub async fn scroll_into_view(frame: &Frame, selector: &str) {
    let _: Result<(), _> = frame
        .evaluate_on_selector(
            selector,
            "el => el.scrollIntoView({ block: 'center', inline: 'center' })",
            None::<()>,
        )
        .await;
    tokio::time::sleep(SCROLL_SETTLE).await;
}

/// Whether the first match of any xpath candidate is visible.
pub async fn any_visible(frame: &Frame, xpaths: &[&str]) -> bool {
    for xpath in xpaths {
        let selector = xpath_selector(xpath);
        if let Ok(Some(handle)) = frame.query_selector(&selector).await {
            if handle.is_visible().await.unwrap_or(false) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xpath_selector_prefixes_once() {
        assert_eq!(xpath_selector("//div[@id='x']"), "xpath=//div[@id='x']");
        assert_eq!(xpath_selector("xpath=//div"), "xpath=//div");
    }
}

//! Post-action assertion evaluation.
//!
//! Assertions run after every action in authored order, stopping at the first
//! failure. Snapshot kinds (`ValidEmail`, `formHasValue`, `elementHasText`)
//! evaluate against values captured at authoring time; the rest probe the
//! live page.

use once_cell::sync::Lazy;
use playwright::api::page::EventType as PageEventType;
use playwright::api::Page;
use regex::Regex;
use std::time::Duration;

use crate::models::test_case::expected_value;
use crate::models::{Action, AssertionResult, ElementDescriptor};

use super::element;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(5);

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Evaluate an action's assertions in authored order, stopping at the first
/// failure. The returned list holds every evaluated result up to and
/// including that failure.
pub async fn evaluate(page: &Page, action: &Action) -> Vec<AssertionResult> {
    let Some(assertions) = &action.assertions else {
        return Vec::new();
    };

    let descriptor = action.element.as_ref();
    let mut results = Vec::new();

    for (kind, spec) in assertions {
        let expected = expected_value(spec);
        let result = evaluate_one(page, descriptor, kind, &expected).await;
        let failed = !result.success;
        results.push(result);
        if failed {
            break;
        }
    }

    results
}

async fn evaluate_one(
    page: &Page,
    descriptor: Option<&ElementDescriptor>,
    kind: &str,
    expected: &str,
) -> AssertionResult {
    let outcome = match kind {
        "ValidEmail" => {
            let value = snapshot_value(descriptor);
            if is_valid_email(&value) {
                Ok(format!("'{value}' is a valid email address"))
            } else {
                Err(format!("'{value}' is not a valid email address"))
            }
        }
        "formHasValue" => {
            let value = snapshot_value(descriptor);
            if value == expected {
                Ok(format!("Form has value '{expected}'"))
            } else {
                Err(format!("Form value '{value}' does not equal '{expected}'"))
            }
        }
        "pageHasTitle" => match page.title().await {
            Ok(title) if contains_ci(&title, expected) => {
                Ok(format!("Page title contains '{expected}'"))
            }
            Ok(title) => Err(format!("Page title '{title}' does not contain '{expected}'")),
            Err(e) => Err(format!("Could not read page title: {e:?}")),
        },
        "pageHasText" => match page
            .eval::<String>("() => document.body.innerText")
            .await
        {
            Ok(text) if contains_ci(&text, expected) => {
                Ok(format!("Page contains text '{expected}'"))
            }
            Ok(_) => Err(format!("Page does not contain text '{expected}'")),
            Err(e) => Err(format!("Could not read page text: {e:?}")),
        },
        "elementHasText" => {
            let text = descriptor
                .and_then(|d| d.text_content.as_deref())
                .unwrap_or_default()
                .trim()
                .to_string();
            if contains_ci(&text, expected) {
                Ok(format!("Element text contains '{expected}'"))
            } else {
                Err(format!("Element text '{text}' does not contain '{expected}'"))
            }
        }
        "elementIsVisible" => {
            let xpaths = descriptor.map(|d| d.xpaths()).unwrap_or_default();
            if element::any_visible(&page.main_frame(), &xpaths).await {
                Ok("Element is visible".to_string())
            } else {
                Err("Element is not visible".to_string())
            }
        }
        "downloadStarted" => {
            if download_started(page, DOWNLOAD_TIMEOUT).await {
                Ok("Download started".to_string())
            } else {
                Err(format!(
                    "No download started within {}s",
                    DOWNLOAD_TIMEOUT.as_secs()
                ))
            }
        }
        other => Err(format!("Unsupported assertion: {other}")),
    };

    match outcome {
        Ok(message) => AssertionResult {
            kind: kind.to_string(),
            message,
            success: true,
        },
        Err(detail) => AssertionResult {
            kind: kind.to_string(),
            message: format!("Assertion failed: {detail}"),
            success: false,
        },
    }
}

fn snapshot_value(descriptor: Option<&ElementDescriptor>) -> String {
    descriptor
        .and_then(|d| d.value.as_deref())
        .unwrap_or_default()
        .to_string()
}

/// Case-insensitive containment check.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Email shape check applied to authoring-time value snapshots.
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value)
}

/// Wait for a download event on the page, bounded by `timeout`.
async fn download_started(page: &Page, timeout: Duration) -> bool {
    matches!(
        tokio::time::timeout(timeout, page.expect_event(PageEventType::Download)).await,
        Ok(Ok(_))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_pattern_accepts_plausible_addresses() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("a.b+tag@sub.example.org"));
    }

    #[test]
    fn email_pattern_rejects_malformed_addresses() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("user@nodot"));
        assert!(!is_valid_email("user example@x.com"));
        assert!(!is_valid_email("@example.com"));
    }

    #[test]
    fn containment_is_case_insensitive() {
        assert!(contains_ci("Welcome Home", "welcome"));
        assert!(contains_ci("WELCOME", "Welcome"));
        assert!(!contains_ci("Welcome", "goodbye"));
    }
}

//! Action interpretation: maps declarative actions onto real browser input.
//!
//! Every action resolves its frame first, performs the browser operation,
//! then runs its assertions. Assertions run even when the action itself
//! failed, and a failing assertion overrides a successful action.

use playwright::api::{DocumentLoadState, File, Frame, Page};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::debug;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::error::{AppError, AppResult};
use crate::models::{Action, ActionKind, AssertionResult, ElementDescriptor};

use super::browser::BrowserSession;
use super::{assertion, element, frame, variable};

/// Poll interval and deadline for the observational navigate check.
const NAVIGATE_POLL_INTERVAL: Duration = Duration::from_secs(1);
const NAVIGATE_CHECK_TIMEOUT: Duration = Duration::from_secs(10);
/// Settle delay after a scroll action.
const SCROLL_ACTION_SETTLE: Duration = Duration::from_secs(1);
/// Cap on the optional readiness wait that precedes each action.
const READY_STATE_TIMEOUT: Duration = Duration::from_secs(5);

/// Style element injected while a drag is in progress so the page cannot
/// scroll under the held pointer.
const DRAG_LOCK_STYLE_ID: &str = "__automation_drag_lock";

/// Result of interpreting one action: the action outcome folded together with
/// its assertion results.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    pub success: bool,
    pub message: String,
    pub assertions: Vec<AssertionResult>,
}

/// Interpret an action, converting any in-step error into a fail outcome.
/// This is the stop-on-failure path: nothing escapes as an error.
pub async fn run_action(
    session: &BrowserSession,
    action: &Action,
    next: Option<&Action>,
) -> ActionOutcome {
    let (success, message) = match dispatch(session, action, next).await {
        Ok(outcome) => outcome,
        Err(e) => (false, e.to_string()),
    };

    let assertions = assertion::evaluate(session.page(), action).await;
    fold_outcome(success, message, assertions)
}

/// Interpret an action, propagating in-step errors to the caller. Kept for
/// the legacy best-effort runner, which stops only on thrown errors.
pub async fn try_run_action(
    session: &BrowserSession,
    action: &Action,
    next: Option<&Action>,
) -> AppResult<ActionOutcome> {
    let (success, message) = dispatch(session, action, next).await?;
    let assertions = assertion::evaluate(session.page(), action).await;
    Ok(fold_outcome(success, message, assertions))
}

/// Fold assertion results into the action outcome: the step passes only if
/// the action succeeded and every assertion held; the first failing
/// assertion's message replaces the action's own message.
fn fold_outcome(
    success: bool,
    message: String,
    assertions: Vec<AssertionResult>,
) -> ActionOutcome {
    match assertions.iter().find(|a| !a.success) {
        Some(failed) => ActionOutcome {
            success: false,
            message: failed.message.clone(),
            assertions,
        },
        None => ActionOutcome {
            success,
            message,
            assertions,
        },
    }
}

async fn dispatch(
    session: &BrowserSession,
    action: &Action,
    next: Option<&Action>,
) -> AppResult<(bool, String)> {
    let page = session.page();
    let target = frame::frame_for(page, action).await?;

    if session.network_idle_wait() {
        wait_for_ready_state(&target).await;
    }

    debug!(kind = %action.action_type, "Dispatching action");

    match action.kind() {
        ActionKind::SystemNavigate => system_navigate(&target, action).await,
        ActionKind::Navigate => navigate_check(&target, action).await,
        ActionKind::MouseDown => mouse_down(page, &target, action, next).await,
        ActionKind::Change => change(&target, action).await,
        ActionKind::Hover => hover(page, action).await,
        ActionKind::Scroll => scroll(&target, action).await,
        ActionKind::FileSelect => file_select(&target, action).await,
        ActionKind::DragStart => drag_start(page, &target, action).await,
        ActionKind::DragEnd => drag_end(page, &target, action).await,
        ActionKind::Key(key) => press_key(page, key).await,
        ActionKind::Unknown(other) => Err(AppError::Capability(format!(
            "Unsupported action type: {other}"
        ))),
    }
}

/// Optional pre-action readiness hook, enabled by configuration. Polls the
/// document ready state instead of a hard network-idle wait.
async fn wait_for_ready_state(target: &Frame) {
    let deadline = Instant::now() + READY_STATE_TIMEOUT;
    while Instant::now() < deadline {
        let ready = target
            .eval::<String>("() => document.readyState")
            .await
            .map(|state| state == "complete")
            .unwrap_or(true);
        if ready {
            return;
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
}

async fn system_navigate(target: &Frame, action: &Action) -> AppResult<(bool, String)> {
    let url = action
        .url
        .as_deref()
        .ok_or_else(|| AppError::ActionRuntime("Navigate action has no url".to_string()))?;

    target
        .goto_builder(url)
        .wait_until(DocumentLoadState::NetworkIdle)
        .goto()
        .await
        .map_err(|e| AppError::Browser(format!("Navigation to {url} failed: {e:?}")))?;

    Ok((true, format!("Navigated to {url}")))
}

/// Observational URL check. Polls until the frame URL matches the expected
/// one or the deadline passes; the comparison only shapes the message, the
/// step itself never fails.
async fn navigate_check(target: &Frame, action: &Action) -> AppResult<(bool, String)> {
    let expected = action.url.as_deref().unwrap_or_default();
    let expected_normalized = frame::normalize_url(expected);

    let deadline = Instant::now() + NAVIGATE_CHECK_TIMEOUT;
    let mut current = String::new();
    loop {
        current = target.url().unwrap_or(current);
        if frame::normalize_url(&current) == expected_normalized {
            return Ok((true, format!("Current URL matches expected {expected}")));
        }
        if Instant::now() >= deadline {
            return Ok((
                true,
                format!("Current URL {current} does not match expected {expected}"),
            ));
        }
        tokio::time::sleep(NAVIGATE_POLL_INTERVAL).await;
    }
}

async fn mouse_down(
    page: &Page,
    target: &Frame,
    action: &Action,
    next: Option<&Action>,
) -> AppResult<(bool, String)> {
    // A click right before a fileSelect would open a native chooser that the
    // driver cannot dismiss; alert-backed elements behave the same way.
    let next_is_file_select = next.map(|n| n.kind() == ActionKind::FileSelect).unwrap_or(false);
    let is_alert = action
        .element
        .as_ref()
        .map(ElementDescriptor::is_alert)
        .unwrap_or(false);
    if next_is_file_select || is_alert {
        return Ok((true, "Click avoided".to_string()));
    }

    let descriptor = action.element.as_ref().ok_or_else(|| {
        AppError::ActionRuntime("Mousedown action has no element descriptor".to_string())
    })?;
    let xpaths = descriptor.xpaths();
    if xpaths.is_empty() {
        return Err(AppError::ActionRuntime(
            "Mousedown action has no xpath target".to_string(),
        ));
    }

    let selector = element::ensure_clickable(target, &xpaths, element::CLICKABLE_TIMEOUT).await?;
    element::scroll_into_view(target, &selector).await;

    let handle = target
        .query_selector(&selector)
        .await
        .map_err(AppError::browser)?
        .ok_or_else(|| AppError::Resolution(format!("Element vanished: {selector}")))?;
    let (x, y) = element_center(&handle).await?;

    page.mouse.r#move(x, y, None).await.map_err(AppError::browser)?;
    page.mouse.down(None, None).await.map_err(AppError::browser)?;
    page.mouse.up(None, None).await.map_err(AppError::browser)?;

    Ok((true, "Clicked element".to_string()))
}

/// Tag plus input type of a form control, read from the live element.
#[derive(Debug, Deserialize)]
struct ControlInfo {
    tag: String,
    kind: String,
}

/// Form-control classes the change action knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ControlClass {
    Text,
    Checkbox,
    Radio,
    Select,
    Unsupported,
}

fn classify_control(tag: &str, kind: &str) -> ControlClass {
    match tag.to_uppercase().as_str() {
        "TEXTAREA" => ControlClass::Text,
        "SELECT" => ControlClass::Select,
        "INPUT" => match kind {
            "checkbox" => ControlClass::Checkbox,
            "radio" => ControlClass::Radio,
            _ => ControlClass::Text,
        },
        _ => ControlClass::Unsupported,
    }
}

async fn change(target: &Frame, action: &Action) -> AppResult<(bool, String)> {
    let descriptor = action.element.as_ref().ok_or_else(|| {
        AppError::ActionRuntime("Change action has no element descriptor".to_string())
    })?;
    if descriptor.is_alert() {
        return Ok((true, "Change ignored".to_string()));
    }

    let resolved =
        element::resolve(target, descriptor, element::DEFAULT_RESOLVE_TIMEOUT).await?;
    element::scroll_into_view(target, &resolved.selector).await;

    let info: ControlInfo = target
        .evaluate_on_selector(
            &resolved.selector,
            "el => ({ tag: el.tagName, kind: (el.type || '').toLowerCase() })",
            None::<()>,
        )
        .await
        .map_err(AppError::browser)?;

    match classify_control(&info.tag, &info.kind) {
        ControlClass::Text => {
            let value = match action.variable.as_ref().filter(|v| v.name.is_some()) {
                Some(variable) => variable::resolve_variable(variable),
                None => action.value.clone().unwrap_or_default(),
            };

            target
                .fill_builder(&resolved.selector, &value)
                .fill()
                .await
                .map_err(|e| AppError::ActionRuntime(format!("Fill failed: {e:?}")))?;
            // React-style listeners only observe dispatched events, not fill
            let _: () = target
                .evaluate_on_selector(
                    &resolved.selector,
                    "el => { el.dispatchEvent(new Event('input', { bubbles: true })); \
                     el.dispatchEvent(new Event('change', { bubbles: true })); }",
                    None::<()>,
                )
                .await
                .map_err(AppError::browser)?;

            Ok((true, "Text entered".to_string()))
        }
        ControlClass::Checkbox => {
            let checked = target
                .check_builder(&resolved.selector)
                .force(true)
                .check()
                .await;
            match checked {
                Ok(_) => Ok((true, "Checkbox toggled".to_string())),
                Err(_) => {
                    // Custom checkboxes often hide the input; its label still works
                    let id: String = target
                        .evaluate_on_selector(
                            &resolved.selector,
                            "el => el.id || ''",
                            None::<()>,
                        )
                        .await
                        .unwrap_or_default();
                    if id.is_empty() {
                        return Err(AppError::ActionRuntime(
                            "Checkbox could not be checked and has no label fallback".to_string(),
                        ));
                    }
                    target
                        .click_builder(&format!("label[for=\"{id}\"]"))
                        .click()
                        .await
                        .map_err(|e| {
                            AppError::ActionRuntime(format!("Label fallback click failed: {e:?}"))
                        })?;
                    Ok((true, "Checkbox toggled via label".to_string()))
                }
            }
        }
        ControlClass::Radio => {
            target
                .check_builder(&resolved.selector)
                .check()
                .await
                .map_err(|e| AppError::ActionRuntime(format!("Radio check failed: {e:?}")))?;
            Ok((true, "Radio selected".to_string()))
        }
        ControlClass::Select => {
            let value = action.value.clone().unwrap_or_default();
            let _: () = target
                .evaluate_on_selector(
                    &resolved.selector,
                    "(el, value) => { el.value = value; \
                     el.dispatchEvent(new Event('change', { bubbles: true })); }",
                    Some(value),
                )
                .await
                .map_err(|e| AppError::ActionRuntime(format!("Select failed: {e:?}")))?;
            Ok((true, "Option selected".to_string()))
        }
        ControlClass::Unsupported => Err(AppError::Capability("Unsupported Type".to_string())),
    }
}

async fn hover(page: &Page, action: &Action) -> AppResult<(bool, String)> {
    let descriptor = action.element.as_ref().ok_or_else(|| {
        AppError::ActionRuntime("Hover action has no element descriptor".to_string())
    })?;

    // Hover always targets the top page
    let top = page.main_frame();
    let resolved = element::resolve(&top, descriptor, element::DEFAULT_RESOLVE_TIMEOUT).await?;
    element::scroll_into_view(&top, &resolved.selector).await;

    page.hover_builder(&resolved.selector)
        .goto()
        .await
        .map_err(AppError::browser)?;

    Ok((true, "Hovered over element".to_string()))
}

async fn scroll(target: &Frame, action: &Action) -> AppResult<(bool, String)> {
    let x = action.scroll_x.unwrap_or(0.0);
    let y = action.scroll_y.unwrap_or(0.0);

    match &action.container_xpath {
        Some(container) => {
            let selector = element::xpath_selector(container);
            let _: () = target
                .evaluate_on_selector(
                    &selector,
                    "(el, [x, y]) => el.scrollTo({ left: x, top: y, behavior: 'smooth' })",
                    Some((x, y)),
                )
                .await
                .map_err(|e| AppError::ActionRuntime(format!("Container scroll failed: {e:?}")))?;
        }
        None => {
            let _: () = target
                .evaluate(
                    "([x, y]) => window.scrollTo({ left: x, top: y, behavior: 'smooth' })",
                    (x, y),
                )
                .await
                .map_err(AppError::browser)?;
        }
    }

    tokio::time::sleep(SCROLL_ACTION_SETTLE).await;
    Ok((true, format!("Scrolled to ({x}, {y})")))
}

async fn press_key(page: &Page, key: &str) -> AppResult<(bool, String)> {
    page.keyboard.down(key).await.map_err(AppError::browser)?;
    page.keyboard.up(key).await.map_err(AppError::browser)?;
    Ok((true, format!("Pressed {key}")))
}

async fn file_select(target: &Frame, action: &Action) -> AppResult<(bool, String)> {
    let data = action.storage_data.as_ref().ok_or_else(|| {
        AppError::ActionRuntime("FileSelect action has no file payload".to_string())
    })?;
    let descriptor = action.element.as_ref().ok_or_else(|| {
        AppError::ActionRuntime("FileSelect action has no element descriptor".to_string())
    })?;

    let resolved =
        element::resolve(target, descriptor, element::DEFAULT_RESOLVE_TIMEOUT).await?;
    element::scroll_into_view(target, &resolved.selector).await;

    // content is a data URL; everything after the first comma is base64
    let payload = data
        .content
        .split_once(',')
        .map(|(_, body)| body)
        .unwrap_or(data.content.as_str());
    BASE64
        .decode(payload)
        .map_err(|e| AppError::ActionRuntime(format!("Invalid file payload: {e}")))?;

    let file = File {
        name: data.name.clone(),
        mime: data.mime.clone(),
        buffer: payload.to_string(),
    };
    resolved
        .handle
        .set_input_files_builder(file)
        .set_input_files()
        .await
        .map_err(AppError::browser)?;

    Ok((true, format!("Selected file {}", data.name)))
}

async fn drag_start(page: &Page, target: &Frame, action: &Action) -> AppResult<(bool, String)> {
    let descriptor = action.element.as_ref().ok_or_else(|| {
        AppError::ActionRuntime("Dragstart action has no element descriptor".to_string())
    })?;

    let resolved =
        element::resolve(target, descriptor, element::DEFAULT_RESOLVE_TIMEOUT).await?;
    element::scroll_into_view(target, &resolved.selector).await;
    let (x, y) = element_center(&resolved.handle).await?;

    // Lock page scrolling while the button is held
    let _ = page
        .eval::<()>(&format!(
            "() => {{ const style = document.createElement('style'); \
             style.id = '{DRAG_LOCK_STYLE_ID}'; \
             style.textContent = 'html, body {{ overflow: hidden !important; \
             height: 100% !important; touch-action: none !important; }}'; \
             document.head.appendChild(style); }}"
        ))
        .await;

    page.mouse.r#move(x, y, None).await.map_err(AppError::browser)?;
    page.mouse.down(None, None).await.map_err(AppError::browser)?;

    Ok((true, "Drag started".to_string()))
}

async fn drag_end(page: &Page, target: &Frame, action: &Action) -> AppResult<(bool, String)> {
    // Prefer the drop target's center; fall back to the viewport center
    let center = match &action.drop_target {
        Some(descriptor) => {
            match element::resolve(target, descriptor, element::DEFAULT_RESOLVE_TIMEOUT).await {
                Ok(resolved) => Some(element_center(&resolved.handle).await?),
                Err(_) => None,
            }
        }
        None => None,
    };
    let (x, y) = match center {
        Some(point) => point,
        None => page
            .eval::<(f64, f64)>("() => [window.innerWidth / 2, window.innerHeight / 2]")
            .await
            .map_err(AppError::browser)?,
    };

    page.mouse.r#move(x, y, None).await.map_err(AppError::browser)?;
    page.mouse.up(None, None).await.map_err(AppError::browser)?;

    let _ = page
        .eval::<()>(&format!(
            "() => {{ const style = document.getElementById('{DRAG_LOCK_STYLE_ID}'); \
             if (style) style.remove(); }}"
        ))
        .await;

    Ok((true, "Drag completed".to_string()))
}

/// Center point of an element's bounding box.
async fn element_center(handle: &playwright::api::ElementHandle) -> AppResult<(f64, f64)> {
    let bounds = handle
        .bounding_box()
        .await
        .map_err(AppError::browser)?
        .ok_or_else(|| {
            AppError::ActionRuntime("Element has no bounding box".to_string())
        })?;
    Ok((
        bounds.x + bounds.width / 2.0,
        bounds.y + bounds.height / 2.0,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assertion(success: bool, message: &str) -> AssertionResult {
        AssertionResult {
            kind: "pageHasText".into(),
            message: message.into(),
            success,
        }
    }

    #[test]
    fn failing_assertion_overrides_successful_action() {
        let outcome = fold_outcome(
            true,
            "Text entered".into(),
            vec![
                assertion(true, "ok"),
                assertion(false, "Assertion failed: Page does not contain text 'X'"),
            ],
        );
        assert!(!outcome.success);
        assert_eq!(
            outcome.message,
            "Assertion failed: Page does not contain text 'X'"
        );
        assert_eq!(outcome.assertions.len(), 2);
    }

    #[test]
    fn passing_assertions_keep_action_outcome() {
        let outcome = fold_outcome(true, "Text entered".into(), vec![assertion(true, "ok")]);
        assert!(outcome.success);
        assert_eq!(outcome.message, "Text entered");

        let failed = fold_outcome(false, "Fill failed".into(), vec![assertion(true, "ok")]);
        assert!(!failed.success);
        assert_eq!(failed.message, "Fill failed");
    }

    #[test]
    fn control_classification_covers_form_kinds() {
        assert_eq!(classify_control("INPUT", "text"), ControlClass::Text);
        assert_eq!(classify_control("input", ""), ControlClass::Text);
        assert_eq!(classify_control("TEXTAREA", ""), ControlClass::Text);
        assert_eq!(classify_control("INPUT", "checkbox"), ControlClass::Checkbox);
        assert_eq!(classify_control("INPUT", "radio"), ControlClass::Radio);
        assert_eq!(classify_control("SELECT", ""), ControlClass::Select);
        assert_eq!(classify_control("DIV", ""), ControlClass::Unsupported);
    }
}

//! Test case and action models mirroring the recorder's JSON format.
//!
//! Actions arrive as foreign JSON authored by the recording frontend, so every
//! field is optional and unknown action types must survive deserialization;
//! they fail later, at interpretation time.

use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use uuid::Uuid;

/// Keyboard key names that are valid action types on their own.
pub const KEY_ACTION_TYPES: [&str; 7] = [
    "Enter",
    "Tab",
    "ArrowUp",
    "ArrowDown",
    "ArrowLeft",
    "ArrowRight",
    "Escape",
];

/// A test case fetched from the catalog: a starting URL plus an ordered
/// sequence of actions. Read-only to this service.
#[derive(Debug, Clone, Deserialize)]
pub struct TestCase {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub actions: Vec<Action>,
    /// Module the case belongs to; carried through to persisted results.
    #[serde(default)]
    pub module_id: Option<Uuid>,
}

/// One declarative step of a test case.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    /// Raw action type as authored. Dispatch happens through [`Action::kind`].
    #[serde(rename = "type")]
    pub action_type: String,
    /// 1-based ordinal; the runner falls back to list position when absent.
    #[serde(default)]
    pub sequence: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub element: Option<ElementDescriptor>,
    /// Defaults to true; only an explicit false targets a child frame.
    #[serde(default)]
    pub is_top_frame: Option<bool>,
    #[serde(default)]
    pub iframe_identifier: Option<IframeIdentifier>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub variable: Option<VariableDescriptor>,
    #[serde(default)]
    pub scroll_x: Option<f64>,
    #[serde(default)]
    pub scroll_y: Option<f64>,
    #[serde(rename = "containerXPath", default)]
    pub container_xpath: Option<String>,
    #[serde(default)]
    pub storage_data: Option<StorageData>,
    #[serde(default)]
    pub drop_target: Option<ElementDescriptor>,
    /// Post-step delay in seconds; default 1.
    #[serde(default)]
    pub wait: Option<f64>,
    /// Assertion kind -> `{ value }`, evaluated in authored order.
    #[serde(default)]
    pub assertions: Option<JsonMap<String, JsonValue>>,
}

impl Action {
    /// Classify the raw type string for dispatch.
    pub fn kind(&self) -> ActionKind<'_> {
        match self.action_type.as_str() {
            "System_Navigate" => ActionKind::SystemNavigate,
            "navigate" => ActionKind::Navigate,
            "mousedown" => ActionKind::MouseDown,
            "change" => ActionKind::Change,
            "hover" => ActionKind::Hover,
            "scroll" => ActionKind::Scroll,
            "fileSelect" => ActionKind::FileSelect,
            "dragstart" => ActionKind::DragStart,
            "dragend" => ActionKind::DragEnd,
            key if KEY_ACTION_TYPES.contains(&key) => ActionKind::Key(key),
            other => ActionKind::Unknown(other),
        }
    }

    /// Whether the action targets the top page rather than an iframe.
    pub fn targets_top_frame(&self) -> bool {
        self.is_top_frame != Some(false)
            || self
                .iframe_identifier
                .as_ref()
                .and_then(|i| i.src.as_deref())
                .is_none()
    }

    /// Display description, falling back to the action type.
    pub fn display_description(&self) -> &str {
        self.description.as_deref().unwrap_or(&self.action_type)
    }
}

/// Action dispatch classification. The `Unknown` arm carries the raw type so
/// the interpreter can report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind<'a> {
    SystemNavigate,
    Navigate,
    MouseDown,
    Change,
    Hover,
    Scroll,
    FileSelect,
    DragStart,
    DragEnd,
    Key(&'a str),
    Unknown(&'a str),
}

/// Selector bundle plus authoring-time snapshots identifying a DOM element.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementDescriptor {
    #[serde(default)]
    pub unique_selector: Option<String>,
    #[serde(default)]
    pub xpath: Option<XpathSpec>,
    #[serde(default)]
    pub is_alert: Option<bool>,
    /// Element value snapshot captured at authoring time.
    #[serde(default)]
    pub value: Option<String>,
    /// Text content snapshot captured at authoring time.
    #[serde(default)]
    pub text_content: Option<String>,
}

impl ElementDescriptor {
    /// Xpath candidates in authored order (a lone string becomes one entry).
    pub fn xpaths(&self) -> Vec<&str> {
        match &self.xpath {
            Some(XpathSpec::Single(x)) => vec![x.as_str()],
            Some(XpathSpec::Many(xs)) => xs.iter().map(String::as_str).collect(),
            None => Vec::new(),
        }
    }

    pub fn is_alert(&self) -> bool {
        self.is_alert == Some(true)
    }
}

/// Recorders emit `xpath` either as a single string or an ordered list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum XpathSpec {
    Single(String),
    Many(Vec<String>),
}

/// Identifies the child frame an action targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IframeIdentifier {
    #[serde(default)]
    pub src: Option<String>,
}

/// Variable substitution descriptor for change actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableDescriptor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub length: Option<usize>,
}

/// Inline file payload for fileSelect actions. `content` is a data URL whose
/// payload after the first comma is base64.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageData {
    pub name: String,
    #[serde(rename = "type")]
    pub mime: String,
    pub content: String,
}

/// Expected value of an assertion entry, tolerant of non-string JSON.
pub fn expected_value(spec: &JsonValue) -> String {
    match spec.get("value") {
        Some(JsonValue::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn xpath_accepts_string_or_list() {
        let single: ElementDescriptor =
            serde_json::from_value(json!({ "xpath": "//button" })).unwrap();
        assert_eq!(single.xpaths(), vec!["//button"]);

        let many: ElementDescriptor =
            serde_json::from_value(json!({ "xpath": ["//a", "//b"] })).unwrap();
        assert_eq!(many.xpaths(), vec!["//a", "//b"]);

        let none: ElementDescriptor = serde_json::from_value(json!({})).unwrap();
        assert!(none.xpaths().is_empty());
    }

    #[test]
    fn unknown_action_type_survives_deserialization() {
        let action: Action = serde_json::from_value(json!({ "type": "teleport" })).unwrap();
        assert_eq!(action.kind(), ActionKind::Unknown("teleport"));
    }

    #[test]
    fn keyboard_keys_classify_as_key_actions() {
        for key in KEY_ACTION_TYPES {
            let action: Action = serde_json::from_value(json!({ "type": key })).unwrap();
            assert_eq!(action.kind(), ActionKind::Key(key));
        }
    }

    #[test]
    fn top_frame_defaults_to_true() {
        let action: Action = serde_json::from_value(json!({ "type": "change" })).unwrap();
        assert!(action.targets_top_frame());

        let framed: Action = serde_json::from_value(json!({
            "type": "change",
            "isTopFrame": false,
            "iframeIdentifier": { "src": "https://example.org/embed" }
        }))
        .unwrap();
        assert!(!framed.targets_top_frame());

        // An explicit false without a recorded src still resolves to the top page.
        let missing_src: Action =
            serde_json::from_value(json!({ "type": "change", "isTopFrame": false })).unwrap();
        assert!(missing_src.targets_top_frame());
    }

    #[test]
    fn assertions_preserve_authored_order() {
        let action: Action = serde_json::from_value(json!({
            "type": "change",
            "assertions": {
                "pageHasText": { "value": "Welcome" },
                "formHasValue": { "value": "hello" },
                "pageHasTitle": { "value": "Home" }
            }
        }))
        .unwrap();

        let kinds: Vec<&str> = action
            .assertions
            .as_ref()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(kinds, vec!["pageHasText", "formHasValue", "pageHasTitle"]);
    }

    #[test]
    fn description_falls_back_to_type() {
        let action: Action = serde_json::from_value(json!({ "type": "mousedown" })).unwrap();
        assert_eq!(action.display_description(), "mousedown");

        let described: Action = serde_json::from_value(
            json!({ "type": "mousedown", "description": "Click the submit button" }),
        )
        .unwrap();
        assert_eq!(described.display_description(), "Click the submit button");
    }

    #[test]
    fn expected_value_tolerates_non_strings() {
        assert_eq!(expected_value(&json!({ "value": "abc" })), "abc");
        assert_eq!(expected_value(&json!({ "value": 42 })), "42");
        assert_eq!(expected_value(&json!({})), "");
    }
}

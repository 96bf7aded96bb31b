//! Run request model and validation.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Browser engine requested for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BrowserEngine {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl BrowserEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chromium => "chromium",
            Self::Firefox => "firefox",
            Self::Webkit => "webkit",
        }
    }
}

/// How authentication state is established before the tests run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LoginMode {
    Social,
    Otp,
}

/// Social-login pre-test reference.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SocialAuth {
    pub auth_test_case_id: Uuid,
}

/// Where OTP auth state is injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum StorageKind {
    #[serde(rename = "localStorage")]
    LocalStorage,
    #[serde(rename = "sessionStorage")]
    SessionStorage,
    #[serde(rename = "cookies")]
    Cookies,
}

/// OTP auth state to seed before any test case runs. `object` is either a
/// JSON object or a JSON-encoded string of one.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OtpSeed {
    pub storage_type: StorageKind,
    pub object: JsonValue,
}

impl OtpSeed {
    /// Default seed applied when an OTP login request carries no payload.
    pub fn empty() -> Self {
        OtpSeed {
            storage_type: StorageKind::LocalStorage,
            object: JsonValue::String("{}".to_string()),
        }
    }

    /// Key/value pairs to inject. Non-string values are stringified, matching
    /// how storage APIs coerce them.
    pub fn entries(&self) -> AppResult<Vec<(String, String)>> {
        let object = match &self.object {
            JsonValue::String(raw) => serde_json::from_str::<JsonValue>(raw)
                .map_err(|e| AppError::Validation(format!("otp.object is not valid JSON: {e}")))?,
            other => other.clone(),
        };

        let map = object.as_object().ok_or_else(|| {
            AppError::Validation("otp.object must be a JSON object".to_string())
        })?;

        Ok(map
            .iter()
            .map(|(k, v)| {
                let value = match v {
                    JsonValue::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), value)
            })
            .collect())
    }
}

/// Body of `POST /api/run-automation`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    /// Run exactly this test case.
    #[serde(default)]
    pub test_case_id: Option<Uuid>,
    /// Or run every test case in these modules, in creation order.
    #[serde(default)]
    pub module_ids: Option<Vec<Uuid>>,
    #[serde(default)]
    pub login_required: bool,
    #[serde(default)]
    pub login_mode: Option<LoginMode>,
    #[serde(default)]
    pub social_auth: Option<SocialAuth>,
    #[serde(default)]
    pub otp: Option<OtpSeed>,
    #[serde(default)]
    pub browser_name: BrowserEngine,
    /// Overrides the server-wide headless default when present.
    #[serde(default)]
    pub headless: Option<bool>,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub project_id: Option<Uuid>,
}

impl RunRequest {
    /// Validate the request and apply defaulting rules.
    ///
    /// Rejects payloads that name neither a test case nor a non-empty module
    /// list; requires the auth test case for social login; fills in an empty
    /// localStorage seed for OTP logins that omit one.
    pub fn validate(&mut self) -> AppResult<()> {
        let has_modules = self
            .module_ids
            .as_ref()
            .map(|m| !m.is_empty())
            .unwrap_or(false);
        if self.test_case_id.is_none() && !has_modules {
            return Err(AppError::Validation(
                "either testCaseId or a non-empty moduleIds is required".to_string(),
            ));
        }

        if self.login_required {
            match self.login_mode {
                Some(LoginMode::Social) => {
                    if self.social_auth.is_none() {
                        return Err(AppError::Validation(
                            "socialAuth.authTestCaseId is required for social login".to_string(),
                        ));
                    }
                }
                Some(LoginMode::Otp) => {
                    if self.otp.is_none() {
                        self.otp = Some(OtpSeed::empty());
                    }
                }
                None => {
                    return Err(AppError::Validation(
                        "loginMode is required when loginRequired is set".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Whether this request runs a batch rather than a single test case.
    pub fn is_batch(&self) -> bool {
        self.test_case_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: JsonValue) -> RunRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn rejects_empty_target() {
        let mut req = request(json!({}));
        assert!(req.validate().is_err());

        let mut req = request(json!({ "moduleIds": [] }));
        assert!(req.validate().is_err());
    }

    #[test]
    fn accepts_single_case_target() {
        let mut req = request(json!({ "testCaseId": Uuid::nil() }));
        assert!(req.validate().is_ok());
        assert!(!req.is_batch());
    }

    #[test]
    fn accepts_module_target() {
        let mut req = request(json!({ "moduleIds": [Uuid::nil()] }));
        assert!(req.validate().is_ok());
        assert!(req.is_batch());
    }

    #[test]
    fn otp_login_defaults_to_empty_local_storage_seed() {
        let mut req = request(json!({
            "testCaseId": Uuid::nil(),
            "loginRequired": true,
            "loginMode": "otp"
        }));
        req.validate().unwrap();

        let otp = req.otp.unwrap();
        assert_eq!(otp.storage_type, StorageKind::LocalStorage);
        assert!(otp.entries().unwrap().is_empty());
    }

    #[test]
    fn social_login_requires_auth_test_case() {
        let mut req = request(json!({
            "testCaseId": Uuid::nil(),
            "loginRequired": true,
            "loginMode": "social"
        }));
        assert!(req.validate().is_err());
    }

    #[test]
    fn otp_entries_parse_string_and_object_payloads() {
        let from_string = OtpSeed {
            storage_type: StorageKind::LocalStorage,
            object: json!(r#"{"token":"abc"}"#),
        };
        assert_eq!(
            from_string.entries().unwrap(),
            vec![("token".to_string(), "abc".to_string())]
        );

        let from_object = OtpSeed {
            storage_type: StorageKind::Cookies,
            object: json!({ "session": { "id": 7 } }),
        };
        assert_eq!(
            from_object.entries().unwrap(),
            vec![("session".to_string(), r#"{"id":7}"#.to_string())]
        );
    }

    #[test]
    fn otp_entries_reject_malformed_payloads() {
        let bad = OtpSeed {
            storage_type: StorageKind::LocalStorage,
            object: json!("not json"),
        };
        assert!(bad.entries().is_err());
    }

    #[test]
    fn browser_engine_defaults_to_chromium() {
        let req = request(json!({ "testCaseId": Uuid::nil() }));
        assert_eq!(req.browser_name, BrowserEngine::Chromium);
        assert_eq!(req.browser_name.as_str(), "chromium");
    }
}

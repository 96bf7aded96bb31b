//! OpenAPI documentation assembly.

use utoipa::OpenApi;

use crate::error::ErrorResponse;
use crate::models::{
    AssertionResult, BrowserEngine, LoginMode, OtpSeed, OverallReport, RunRequest, RunStatus,
    SocialAuth, StepResult, StorageKind, TestReport,
};

/// OpenAPI document for the automation API.
#[derive(OpenApi)]
#[openapi(
    paths(crate::api::run_automation::run_automation),
    components(schemas(
        RunRequest,
        BrowserEngine,
        LoginMode,
        SocialAuth,
        OtpSeed,
        StorageKind,
        TestReport,
        OverallReport,
        StepResult,
        AssertionResult,
        RunStatus,
        ErrorResponse,
    )),
    tags(
        (name = "Automation", description = "Browser test execution")
    )
)]
pub struct ApiDoc;

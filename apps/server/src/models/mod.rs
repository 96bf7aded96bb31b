//! Domain and wire models.

pub mod report;
pub mod request;
pub mod test_case;

pub use report::{AssertionResult, OverallReport, RunOutcome, RunStatus, StepResult, TestReport};
pub use request::{BrowserEngine, LoginMode, OtpSeed, RunRequest, SocialAuth, StorageKind};
pub use test_case::{
    Action, ActionKind, ElementDescriptor, IframeIdentifier, StorageData, TestCase,
    VariableDescriptor, XpathSpec,
};

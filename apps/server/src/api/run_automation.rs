//! Run-automation API handler: the single entry point that executes test
//! cases against a real browser.

use actix_web::{post, web, HttpResponse};
use tracing::info;

use crate::config::Config;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::RunRequest;
use crate::services::orchestrator;

/// Execute a single test case or a batch of test cases.
///
/// The request either names one `testCaseId` or a non-empty `moduleIds` list;
/// batches run in creation order within one shared browser session. Responds
/// with a `TestReport` (single) or an `OverallReport` (batch).
#[utoipa::path(
    post,
    path = "/api/run-automation",
    tag = "Automation",
    request_body = RunRequest,
    responses(
        (status = 200, description = "Execution report", body = crate::models::TestReport),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 404, description = "Referenced test case not found", body = crate::error::ErrorResponse),
        (status = 500, description = "Driver or execution failure", body = crate::error::ErrorResponse)
    )
)]
#[post("/run-automation")]
pub async fn run_automation(
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    body: web::Json<RunRequest>,
) -> AppResult<HttpResponse> {
    let mut request = body.into_inner();
    request.validate()?;

    info!(
        browser = request.browser_name.as_str(),
        batch = request.is_batch(),
        login = request.login_required,
        "Run requested"
    );

    let outcome = orchestrator::execute(&pool, &config, &request).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// Configure automation routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(run_automation);
}

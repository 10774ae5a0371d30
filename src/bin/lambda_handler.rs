//! AWS Lambda handler for business-plan projections
//!
//! Accepts a sector id plus plan overrides as JSON and returns the full
//! projection result. Each request is an independent computation against the
//! builtin sector catalog.
//!
//! Supports Lambda Function URLs for direct HTTP access.

use aws_lambda_events::event::lambda_function_urls::{LambdaFunctionUrlRequest, LambdaFunctionUrlResponse};
use aws_lambda_events::http::HeaderMap;
use bizplan::{PlanOverrides, ProjectionEngine, ProjectionResult, ProjectionSummary, ScenarioRunner, SensitivityCase};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Input for one plan computation
#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    /// Catalog sector id (e.g. "gym-fitness")
    pub sector: String,

    #[serde(default)]
    pub overrides: PlanOverrides,

    /// Include the month-by-month table (default: true)
    #[serde(default = "default_true")]
    pub include_months: bool,

    /// Also run the pessimistic/base/optimistic stress
    #[serde(default)]
    pub sensitivity: bool,
}

fn default_true() -> bool { true }

/// Output of one plan computation
#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub summary: ProjectionSummary,
    pub result: ProjectionResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensitivity: Option<Vec<SensitivityCase>>,
    pub execution_time_ms: u64,
}

fn response(status: i64, body: String) -> LambdaFunctionUrlResponse {
    let mut headers = HeaderMap::new();
    for (name, value) in [
        ("content-type", "application/json"),
        ("access-control-allow-origin", "*"),
        ("access-control-allow-methods", "POST, OPTIONS"),
        ("access-control-allow-headers", "Content-Type"),
    ] {
        if let Ok(value) = value.parse() {
            headers.insert(name, value);
        }
    }
    LambdaFunctionUrlResponse {
        status_code: status,
        headers,
        body: Some(body),
        is_base64_encoded: false,
        cookies: vec![],
    }
}

fn error_response(status: i64, message: &str) -> LambdaFunctionUrlResponse {
    let body = serde_json::json!({ "error": message }).to_string();
    response(status, body)
}

/// Lambda handler function
async fn handler(event: LambdaEvent<LambdaFunctionUrlRequest>) -> Result<LambdaFunctionUrlResponse, Error> {
    let start = std::time::Instant::now();
    let request = event.payload;

    // Handle CORS preflight
    if request.request_context.http.method.as_deref() == Some("OPTIONS") {
        return Ok(response(200, String::new()));
    }

    if request.is_base64_encoded {
        return Ok(error_response(400, "Base64-encoded bodies are not supported"));
    }
    let body = request.body.unwrap_or_else(|| "{}".to_string());

    let plan: PlanRequest = match serde_json::from_str(&body) {
        Ok(p) => p,
        Err(e) => return Ok(error_response(400, &format!("Invalid JSON: {}", e))),
    };

    let engine = ProjectionEngine::default();
    let mut result = match engine.compute(&plan.sector, &plan.overrides) {
        Ok(r) => r,
        Err(e) => {
            warn!("Plan for {} rejected: {}", plan.sector, e);
            return Ok(error_response(422, &e.to_string()));
        }
    };

    let sensitivity = if plan.sensitivity {
        match ScenarioRunner::new().sensitivity(&plan.sector, &plan.overrides) {
            Ok(cases) => Some(cases),
            Err(e) => return Ok(error_response(422, &e.to_string())),
        }
    } else {
        None
    };

    let summary = result.summary();
    if !plan.include_months {
        result.months.clear();
    }

    let execution_time_ms = start.elapsed().as_millis() as u64;
    info!("Computed {} in {} ms", plan.sector, execution_time_ms);

    let body = PlanResponse { summary, result, sensitivity, execution_time_ms };
    match serde_json::to_string(&body) {
        Ok(json) => Ok(response(200, json)),
        Err(e) => Ok(error_response(500, &format!("Serialization failed: {}", e))),
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    run(service_fn(handler)).await
}

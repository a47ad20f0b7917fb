//! Router tests driven through `tower::ServiceExt::oneshot`.

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use triage_rs_core::{AiClient, StaticPatientSource, TriageAgent, builtin_skill_registry};
use triage_rs_protocol::{Decision, RiskLevel};
use triage_rs_server::{AppState, router};
use triage_rs_test_utils::{FailingAi, FixedAi, decision_json};

fn state_with(ai: Option<Arc<dyn AiClient>>) -> AppState {
    let mut builder = TriageAgent::builder()
        .node_id("clinical-triage")
        .version("1.0.0")
        .patients(Arc::new(StaticPatientSource::embedded().expect("embedded")));
    if let Some(ai) = ai {
        builder = builder.ai(ai);
    }
    AppState::new(builder.build(), builtin_skill_registry())
}

fn state() -> AppState {
    let ai: Arc<dyn AiClient> = Arc::new(FixedAi::new(decision_json(
        Decision::Escalate,
        RiskLevel::High,
        0.85,
    )));
    state_with(Some(ai))
}

async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Value) {
    let response = router(state).oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn execute(target: &str, body: Value) -> Request<Body> {
    Request::post(format!("/api/v1/execute/{target}"))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

/// Health reports node identity.
#[tokio::test]
async fn health_reports_node() {
    let request = Request::get("/health").body(Body::empty()).expect("request");
    let (status, body) = send(state(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"ok": true, "node_id": "clinical-triage", "version": "1.0.0"})
    );
}

/// Skill listing includes skills and reasoners.
#[tokio::test]
async fn lists_skill_specs() {
    let request = Request::get("/api/v1/skills")
        .body(Body::empty())
        .expect("request");
    let (status, body) = send(state(), request).await;
    assert_eq!(status, StatusCode::OK);
    let specs = body.as_array().expect("array");
    assert_eq!(specs.len(), 9);
    assert!(specs.iter().any(|spec| spec["name"] == json!("clinical_triage_patient")
        && spec["kind"] == json!("reasoner")));
}

/// Normalization returns the context under `result`.
#[tokio::test]
async fn execute_normalize() {
    let (status, body) = send(
        state(),
        execute(
            "clinical-triage.patient_normalize_patient",
            json!({"input": {"patient_id": "P003"}}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["result"]["trend_summary"],
        json!("respiratory rate increasing")
    );
}

/// Full workflow over HTTP.
#[tokio::test]
async fn execute_triage_workflow() {
    let state = state();
    let (status, body) = send(
        state.clone(),
        execute(
            "clinical-triage.clinical_triage_patient",
            json!({"input": {"patient_id": "P001"}}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["notification_sent"], json!(true));

    let (_, history) = send(
        state,
        execute(
            "clinical-triage.patient_get_decision_history",
            json!({"input": {"patient_id": "P001"}}),
        ),
    )
    .await;
    assert_eq!(history["result"]["decision_count"], json!(1));
}

/// Targets must name this node and a registered skill.
#[tokio::test]
async fn unknown_targets_are_not_found() {
    for target in [
        "other-node.clinical_echo",
        "clinical_echo",
        "clinical-triage.clinical_discharge",
    ] {
        let (status, body) = send(
            state(),
            execute(target, json!({"input": {"message": "hi"}})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{target}");
        assert!(body["error"].as_str().expect("error").contains("unknown target"));
    }
}

/// Argument decoding failures are 400.
#[tokio::test]
async fn invalid_arguments_are_bad_request() {
    let (status, body) = send(
        state(),
        execute(
            "clinical-triage.patient_send_notification",
            json!({"input": {"patient_id": "P001", "decision": "escalate", "risk_level": "critical", "rationale": "x"}}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

/// Missing context and unknown patients are 404.
#[tokio::test]
async fn missing_data_is_not_found() {
    let (status, _) = send(
        state(),
        execute(
            "clinical-triage.patient_get_patient_context",
            json!({"input": {"patient_id": "P002"}}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        state(),
        execute(
            "clinical-triage.patient_normalize_patient",
            json!({"input": {"patient_id": "P999"}}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("patient P999 not found"));
}

/// AI failures and a missing AI client are 502.
#[tokio::test]
async fn ai_failures_are_bad_gateway() {
    let failing: Arc<dyn AiClient> = Arc::new(FailingAi::new("down"));
    for state in [state_with(Some(failing)), state_with(None)] {
        let (status, _) = send(
            state,
            execute(
                "clinical-triage.clinical_triage_patient",
                json!({"input": {"patient_id": "P001"}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }
}

/// A model answer that fails validation is an upstream fault, not a bad request.
#[tokio::test]
async fn invalid_model_output_is_bad_gateway() {
    let ai: Arc<dyn AiClient> = Arc::new(FixedAi::new(
        r#"{"escalation_decision":"escalate","risk_level":"high","confidence":1.7,"rationale":"?"}"#,
    ));
    let (status, body) = send(
        state_with(Some(ai)),
        execute(
            "clinical-triage.clinical_triage_patient",
            json!({"input": {"patient_id": "P001"}}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let message = body["error"].as_str().expect("error message");
    assert!(message.contains("invalid model output"), "{message}");
}

/// A body that is not JSON is rejected before dispatch.
#[tokio::test]
async fn malformed_body_is_bad_request() {
    let request = Request::post("/api/v1/execute/clinical-triage.clinical_echo")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .expect("request");
    let (status, body) = send(state(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

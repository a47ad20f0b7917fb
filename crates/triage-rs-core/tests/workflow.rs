//! End-to-end triage workflow tests over the embedded dataset.

use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use triage_rs_core::{AiError, StaticPatientSource, TriageAgent, TriageError};
use triage_rs_memory::{InMemoryStore, MemoryStore, context_key, history_key};
use triage_rs_protocol::{
    Decision, DeliveryStatus, NotificationKind, RiskLevel, ValidationError,
};
use triage_rs_test_utils::{
    FailingAi, FailingMemory, FailingNotifier, FixedAi, RecordingAi, RecordingNotifier,
    decision_json,
};

fn agent(
    ai: Arc<dyn triage_rs_core::AiClient>,
    memory: Arc<dyn MemoryStore>,
    notifier: RecordingNotifier,
) -> TriageAgent {
    TriageAgent::builder()
        .node_id("ward-7")
        .patients(Arc::new(StaticPatientSource::embedded().expect("embedded")))
        .memory(memory)
        .notifier(Arc::new(notifier))
        .ai(ai)
        .build()
}

/// An escalation stores context, notifies once and logs one entry.
#[tokio::test]
async fn escalation_runs_every_step() {
    let memory = Arc::new(InMemoryStore::new());
    let notifier = RecordingNotifier::new();
    let ai = Arc::new(FixedAi::new(decision_json(
        Decision::Escalate,
        RiskLevel::High,
        0.85,
    )));
    let agent = agent(ai, memory.clone(), notifier.clone());

    let outcome = agent.triage_patient("P001").await.expect("triage");
    assert_eq!(outcome.patient_id, "P001");
    assert_eq!(outcome.workflow, "complete");
    assert!(outcome.notification_sent);
    assert_eq!(outcome.decision.risk_level, RiskLevel::High);

    let stored = memory
        .get(&context_key("P001"))
        .await
        .expect("get")
        .expect("context stored");
    assert_eq!(
        stored["trend_summary"],
        json!(
            "heart rate increasing; respiratory rate increasing; elevated CRP (12.5 mg/L); elevated WBC (11200); creatinine trending up"
        )
    );

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, NotificationKind::ClinicalEscalation);
    assert_eq!(sent[0].status, DeliveryStatus::Sent);
    assert_eq!(sent[0].message, outcome.decision.rationale);

    let history = agent.get_decision_history("P001").await.expect("history");
    assert_eq!(history.decision_count, 1);
    assert_eq!(history.history[0].logged_by, "ward-7");
    assert_eq!(
        history.history[0].decision["confidence"],
        json!(0.85)
    );
}

/// A monitor decision logs without notifying.
#[tokio::test]
async fn monitor_decision_does_not_notify() {
    let notifier = RecordingNotifier::new();
    let ai = Arc::new(FixedAi::new(decision_json(
        Decision::Monitor,
        RiskLevel::Low,
        0.9,
    )));
    let agent = agent(ai, Arc::new(InMemoryStore::new()), notifier.clone());

    let outcome = agent.triage_patient("P002").await.expect("triage");
    assert!(!outcome.notification_sent);
    assert!(notifier.sent().is_empty());
    assert_eq!(
        agent
            .get_decision_history("P002")
            .await
            .expect("history")
            .decision_count,
        1
    );
}

/// Each run gets its own workflow id and history grows in order.
#[tokio::test]
async fn repeated_runs_append_history() {
    let ai = Arc::new(FixedAi::sequence([
        decision_json(Decision::Monitor, RiskLevel::Medium, 0.6),
        decision_json(Decision::Escalate, RiskLevel::High, 0.8),
    ]));
    let agent = agent(ai, Arc::new(InMemoryStore::new()), RecordingNotifier::new());

    agent.triage_patient("P003").await.expect("first");
    agent.triage_patient("P003").await.expect("second");

    let history = agent.get_decision_history("P003").await.expect("history");
    assert_eq!(history.decision_count, 2);
    assert_eq!(
        history.history[0].decision["escalation_decision"],
        json!("monitor")
    );
    assert_eq!(
        history.history[1].decision["escalation_decision"],
        json!("escalate")
    );
    assert_ne!(history.history[0].workflow_id, history.history[1].workflow_id);
}

/// The prompt carries the stored context.
#[tokio::test]
async fn evaluation_prompt_reflects_context() {
    let ai = Arc::new(RecordingAi::new(decision_json(
        Decision::Escalate,
        RiskLevel::High,
        0.85,
    )));
    let agent = agent(ai.clone(), Arc::new(InMemoryStore::new()), RecordingNotifier::new());
    agent.store_patient_context("P001").await.expect("store");
    agent.evaluate_risk("P001").await.expect("evaluate");

    assert_eq!(ai.calls(), 1);
    let request = ai.requests.lock()[0].clone();
    assert!(request.system.contains("patient safety"));
    assert!(request.user.contains("Age: 68"));
    assert!(request.user.contains("CRP: 12.5"));
    assert!(request.user.contains("heart_rate: increasing"));
    let schema = request.schema.expect("schema");
    assert_eq!(schema.name, "EscalationDecision");
}

/// Invalid model output stops the workflow before anything is logged.
#[tokio::test]
async fn invalid_model_output_aborts_before_logging() {
    let notifier = RecordingNotifier::new();
    let ai = Arc::new(FixedAi::new(
        r#"{"escalation_decision":"escalate","risk_level":"critical","confidence":0.9,"rationale":"?"}"#,
    ));
    let memory = Arc::new(InMemoryStore::new());
    let agent = agent(ai, memory.clone(), notifier.clone());

    let err = agent.triage_patient("P001").await.unwrap_err();
    assert!(matches!(
        err,
        TriageError::Ai(AiError::InvalidOutput(ValidationError::UnknownVariant { .. }))
    ));
    assert!(notifier.sent().is_empty());
    assert!(
        memory
            .get(&history_key("P001"))
            .await
            .expect("get")
            .is_none()
    );
    // Context storage ran before the failing step.
    assert!(
        memory
            .get(&context_key("P001"))
            .await
            .expect("get")
            .is_some()
    );
}

/// AI failures surface unchanged.
#[tokio::test]
async fn ai_failure_surfaces() {
    let agent = agent(
        Arc::new(FailingAi::new("timeout")),
        Arc::new(InMemoryStore::new()),
        RecordingNotifier::new(),
    );
    let err = agent.triage_patient("P001").await.unwrap_err();
    assert!(matches!(err, TriageError::Ai(AiError::Provider(message)) if message == "timeout"));
}

/// A failed notification aborts before logging.
#[tokio::test]
async fn notification_failure_aborts_logging() {
    let memory = Arc::new(InMemoryStore::new());
    let agent = TriageAgent::builder()
        .patients(Arc::new(StaticPatientSource::embedded().expect("embedded")))
        .memory(memory.clone())
        .notifier(Arc::new(FailingNotifier))
        .ai(Arc::new(FixedAi::new(decision_json(
            Decision::Escalate,
            RiskLevel::High,
            0.85,
        ))))
        .build();
    let err = agent.triage_patient("P001").await.unwrap_err();
    assert!(matches!(err, TriageError::Notify(_)));
    assert!(
        memory
            .get(&history_key("P001"))
            .await
            .expect("get")
            .is_none()
    );
}

/// Memory failures surface as memory errors.
#[tokio::test]
async fn memory_failure_surfaces() {
    let agent = agent(
        Arc::new(FixedAi::new(decision_json(
            Decision::Monitor,
            RiskLevel::Low,
            0.9,
        ))),
        Arc::new(FailingMemory),
        RecordingNotifier::new(),
    );
    let err = agent.triage_patient("P002").await.unwrap_err();
    assert!(matches!(err, TriageError::Memory(_)));
}

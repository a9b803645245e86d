//! End-to-end worker scenarios against the in-memory store and mock broker

use async_trait::async_trait;
use fraudguard_core::{
    AggregateFunction, ComparisonOp, DeviceUsed, Expression, FieldRef, PaymentChannel, Profile,
    RuleConfig, RuleKind, RuleRequest, RuleResult, RuleStatus, Transaction, TransactionType,
};
use fraudguard_engine::{
    JsonRequestCodec, JsonResultCodec, MockBroker, ResultProducer, RuleFactory, RuleWorker, Scorer,
};
use fraudguard_store::{MemoryHistory, TransactionHistory};
use std::sync::Arc;

struct FixedScorer(f64);

#[async_trait]
impl Scorer for FixedScorer {
    async fn predict(
        &self,
        _model_uuid: &str,
        _txn: &Transaction,
        _history: &dyn TransactionHistory,
    ) -> fraudguard_ml::Result<f64> {
        Ok(self.0)
    }
}

fn txn(id: &str, account: &str, amount: f64, ts: i64, location: &str) -> Transaction {
    Transaction {
        transaction_id: id.to_string(),
        sender_account: account.to_string(),
        receiver_account: "B".to_string(),
        amount,
        timestamp: ts.to_string(),
        transaction_type: TransactionType::Transfer,
        merchant_category: "electronics".to_string(),
        location: location.to_string(),
        device_used: DeviceUsed::Web,
        payment_channel: PaymentChannel::Card,
        ip_address: "10.0.0.1".to_string(),
        device_hash: "h".to_string(),
    }
}

fn rule(uuid: &str, is_critical: bool, kind: RuleKind) -> RuleConfig {
    RuleConfig {
        uuid: uuid.to_string(),
        name: format!("{uuid}-name"),
        is_critical,
        kind,
    }
}

fn request(rule: RuleConfig, transaction: Transaction) -> Vec<u8> {
    let request = RuleRequest {
        profile_uuid: "p-1".to_string(),
        profile_name: "profile one".to_string(),
        rule,
        transaction,
        number: 0,
        total_rule_count: 1,
    };
    serde_json::to_vec(&request).unwrap()
}

struct Harness {
    worker: RuleWorker,
    broker: Arc<MockBroker>,
    history: Arc<MemoryHistory>,
}

fn harness(scorer: Option<Arc<dyn Scorer>>) -> Harness {
    let broker = Arc::new(MockBroker::new());
    let history = Arc::new(MemoryHistory::new());
    let producer = ResultProducer::new(
        broker.clone(),
        Arc::new(JsonResultCodec),
        "Response".to_string(),
    );
    let factory = RuleFactory::new(Some(history.clone()), scorer);
    let worker = RuleWorker::new(
        Arc::new(JsonRequestCodec),
        factory,
        Some(history.clone()),
        producer,
    );
    Harness {
        worker,
        broker,
        history,
    }
}

fn published_result(broker: &MockBroker) -> RuleResult {
    let published = broker.published_to("Response");
    assert_eq!(published.len(), 1);
    serde_json::from_slice(&published[0].payload).unwrap()
}

fn amount_gt_500() -> RuleKind {
    RuleKind::Threshold {
        expression: Expression::comparison(
            Expression::field(FieldRef::Amount),
            ComparisonOp::GreaterThan,
            Expression::literal(500.0),
        ),
    }
}

#[tokio::test]
async fn threshold_fires() {
    let h = harness(None);
    let payload = request(rule("r-1", false, amount_gt_500()), txn("T1", "A", 600.0, 1_700_000_000, "US"));

    h.worker.process(&payload).await;

    let result = published_result(&h.broker);
    assert_eq!(result.transaction_id, "T1");
    assert_eq!(result.config_uuid, "r-1");
    assert_eq!(result.status, RuleStatus::Fraud);
    assert_eq!(
        result.description,
        "Threshold rule applied, amount: 600.000000"
    );
}

#[tokio::test]
async fn threshold_does_not_fire() {
    let h = harness(None);
    let payload = request(rule("r-1", false, amount_gt_500()), txn("T1", "A", 100.0, 1_700_000_000, "US"));

    h.worker.process(&payload).await;

    assert_eq!(published_result(&h.broker).status, RuleStatus::NotFraud);
}

#[tokio::test]
async fn pattern_aggregate_fires_on_burst() {
    let h = harness(None);
    let now = 1_700_000_000;
    for i in 0..4 {
        h.history
            .save(&txn(&format!("H{i}"), "A", 50.0, now - 5 - i, "US"))
            .await
            .unwrap();
    }

    let kind = RuleKind::Pattern {
        expression: Expression::comparison(
            Expression::aggregate(AggregateFunction::Count, None),
            ComparisonOp::GreaterThan,
            Expression::literal(3),
        ),
        max_delta_time: Some(60),
        max_count: None,
    };
    let payload = request(rule("r-2", false, kind), txn("T1", "A", 75.0, now, "US"));

    h.worker.process(&payload).await;

    let result = published_result(&h.broker);
    assert_eq!(result.status, RuleStatus::Fraud);
    assert_eq!(result.description, "Pattern rule applied");
}

#[tokio::test]
async fn critical_composite_escalates() {
    let h = harness(None);
    let kind = RuleKind::Composite {
        expression: Expression::and(vec![
            Expression::comparison(
                Expression::field(FieldRef::Amount),
                ComparisonOp::GreaterThan,
                Expression::literal(1000.0),
            ),
            Expression::comparison(
                Expression::field(FieldRef::Location),
                ComparisonOp::Equal,
                Expression::literal("RU"),
            ),
        ]),
    };
    let payload = request(rule("r-3", true, kind), txn("T1", "A", 1500.0, 1_700_000_000, "RU"));

    h.worker.process(&payload).await;

    assert_eq!(published_result(&h.broker).status, RuleStatus::Critical);
}

#[tokio::test]
async fn ml_below_threshold_is_not_fraud() {
    let h = harness(Some(Arc::new(FixedScorer(0.32))));
    let kind = RuleKind::Ml {
        model_uuid: "m-1".to_string(),
        lower_bound: 0.5,
    };
    let payload = request(rule("r-4", false, kind), txn("T1", "A", 600.0, 1_700_000_000, "US"));

    h.worker.process(&payload).await;

    let result = published_result(&h.broker);
    assert_eq!(result.status, RuleStatus::NotFraud);
    assert!(result.description.contains("0.3200"));
}

#[tokio::test]
async fn malformed_request_produces_error_result() {
    let h = harness(None);

    h.worker.process(b"definitely not a rule request").await;

    let result = published_result(&h.broker);
    assert_eq!(result.status, RuleStatus::Error);
    assert_eq!(result.transaction_id, "");
    assert_eq!(result.profile_uuid, "");
    assert_eq!(result.config_uuid, "");
    assert_eq!(
        result.description,
        "Failed to parse RuleRequest from Kafka message"
    );
}

#[tokio::test]
async fn ml_without_scorer_is_configuration_error() {
    let h = harness(None);
    let kind = RuleKind::Ml {
        model_uuid: "m-1".to_string(),
        lower_bound: 0.5,
    };
    let payload = request(rule("r-5", false, kind), txn("T1", "A", 600.0, 1_700_000_000, "US"));

    h.worker.process(&payload).await;

    let result = published_result(&h.broker);
    assert_eq!(result.status, RuleStatus::Error);
    assert!(result.description.starts_with("Error: "));
}

#[tokio::test]
async fn transaction_is_persisted_before_evaluation() {
    let h = harness(None);
    let payload = request(rule("r-1", false, amount_gt_500()), txn("T1", "A", 600.0, 1_700_000_000, "US"));

    h.worker.process(&payload).await;

    let rows = h.history.account_history("A", 10).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].transaction_id, "T1");
}

#[tokio::test]
async fn profile_identity_survives_into_result() {
    // sanity check that profile fields map straight through
    let h = harness(None);
    let payload = request(rule("r-1", false, amount_gt_500()), txn("T1", "A", 600.0, 1_700_000_000, "US"));

    h.worker.process(&payload).await;

    let result = published_result(&h.broker);
    assert_eq!(result.profile_uuid, "p-1");
    assert_eq!(result.profile_name, "profile one");

    // keep the Profile type honest about uuid identity while we are here
    let p1 = Profile {
        uuid: "p-1".to_string(),
        name: "x".to_string(),
        rules: vec![],
    };
    let p2 = Profile {
        uuid: "p-1".to_string(),
        name: "y".to_string(),
        rules: vec![],
    };
    assert_eq!(p1, p2);
}

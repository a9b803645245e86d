//! The director: active profile snapshot and transaction fan-out

use crate::dispatch::{produce_rule_requests, SendStatus};
use arc_swap::ArcSwap;
use fraudguard_core::{ProfileSet, Transaction};
use fraudguard_engine::MessagePublisher;
use std::sync::Arc;

/// Totals for one transaction's fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchSummary {
    pub profiles: usize,
    pub pairs_published: usize,
    pub retryable_failures: usize,
    pub failed_batches: usize,
}

/// Owns the active profile set and fans incoming transactions out to the
/// request topic.
///
/// The snapshot is replaced wholesale on each profile refresh; dispatch
/// tasks capture the snapshot at task start and are unaffected by a
/// concurrent replacement.
pub struct Director {
    topic: String,
    publisher: Arc<dyn MessagePublisher>,
    profiles: ArcSwap<ProfileSet>,
}

impl Director {
    pub fn new(publisher: Arc<dyn MessagePublisher>, topic: String) -> Self {
        Self {
            topic,
            publisher,
            profiles: ArcSwap::from_pointee(ProfileSet::new()),
        }
    }

    /// Atomically replace the active profile set.
    pub fn refresh_profiles(&self, profiles: ProfileSet) {
        tracing::info!(
            profiles = profiles.len(),
            rule_pairs = profiles.rule_pair_count(),
            "refreshing active profile set"
        );
        self.profiles.store(Arc::new(profiles));
    }

    /// The snapshot currently in force.
    pub fn snapshot(&self) -> Arc<ProfileSet> {
        self.profiles.load_full()
    }

    /// Enqueue a transaction for fan-out and return immediately.
    pub fn enqueue(self: &Arc<Self>, transaction: Transaction) {
        let director = Arc::clone(self);
        tokio::spawn(async move {
            director.dispatch(transaction).await;
        });
    }

    /// Fan the transaction out across the captured snapshot: one rule
    /// request per (profile, rule) pair.
    pub async fn dispatch(&self, transaction: Transaction) -> DispatchSummary {
        let snapshot = self.snapshot();
        let mut summary = DispatchSummary {
            profiles: snapshot.len(),
            ..DispatchSummary::default()
        };

        for profile in snapshot.iter() {
            let (published, status) = produce_rule_requests(
                self.publisher.as_ref(),
                &self.topic,
                profile,
                &transaction,
            )
            .await;

            summary.pairs_published += published;
            match status {
                SendStatus::Success => {}
                SendStatus::Retryable => summary.retryable_failures += 1,
                SendStatus::NonRetryable | SendStatus::Serialization => {
                    summary.failed_batches += 1
                }
            }
            tracing::debug!(
                profile_uuid = %profile.uuid,
                published,
                ?status,
                "profile batch dispatched"
            );
        }

        tracing::info!(
            transaction_id = %transaction.transaction_id,
            profiles = summary.profiles,
            pairs_published = summary.pairs_published,
            "transaction fan-out complete"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fraudguard_core::{
        ComparisonOp, DeviceUsed, Expression, FieldRef, PaymentChannel, Profile, RuleConfig,
        RuleKind, TransactionType,
    };
    use fraudguard_engine::MockBroker;

    fn rule(uuid: &str) -> RuleConfig {
        RuleConfig {
            uuid: uuid.to_string(),
            name: uuid.to_string(),
            is_critical: false,
            kind: RuleKind::Threshold {
                expression: Expression::comparison(
                    Expression::field(FieldRef::Amount),
                    ComparisonOp::GreaterThan,
                    Expression::literal(500.0),
                ),
            },
        }
    }

    fn profile(uuid: &str, rules: usize) -> Profile {
        Profile {
            uuid: uuid.to_string(),
            name: format!("{uuid}-name"),
            rules: (0..rules).map(|i| rule(&format!("{uuid}-r{i}"))).collect(),
        }
    }

    fn transaction(id: &str) -> Transaction {
        Transaction {
            transaction_id: id.to_string(),
            sender_account: "A".to_string(),
            receiver_account: "B".to_string(),
            amount: 600.0,
            timestamp: "1700000000".to_string(),
            transaction_type: TransactionType::Payment,
            merchant_category: "retail".to_string(),
            location: "US".to_string(),
            device_used: DeviceUsed::Web,
            payment_channel: PaymentChannel::Card,
            ip_address: "10.0.0.1".to_string(),
            device_hash: "h".to_string(),
        }
    }

    #[tokio::test]
    async fn test_fan_out_completeness() {
        let broker = Arc::new(MockBroker::new());
        let director = Director::new(broker.clone(), "Request".to_string());

        let snapshot: ProfileSet = vec![profile("p-1", 2), profile("p-2", 3)]
            .into_iter()
            .collect();
        director.refresh_profiles(snapshot);

        let summary = director.dispatch(transaction("T1")).await;

        // exactly sum over profiles of |rules|
        assert_eq!(summary.pairs_published, 5);
        assert_eq!(summary.profiles, 2);
        assert_eq!(broker.message_count(), 5);
    }

    #[tokio::test]
    async fn test_empty_snapshot_dispatches_nothing() {
        let broker = Arc::new(MockBroker::new());
        let director = Director::new(broker.clone(), "Request".to_string());

        let summary = director.dispatch(transaction("T1")).await;
        assert_eq!(summary.pairs_published, 0);
        assert_eq!(broker.message_count(), 0);
    }

    #[tokio::test]
    async fn test_snapshot_replacement_is_wholesale() {
        let broker = Arc::new(MockBroker::new());
        let director = Director::new(broker.clone(), "Request".to_string());

        director.refresh_profiles(vec![profile("p-1", 2)].into_iter().collect());
        let before = director.snapshot();

        director.refresh_profiles(vec![profile("p-2", 1)].into_iter().collect());
        let after = director.snapshot();

        // the captured snapshot still sees the old set
        assert!(before.get("p-1").is_some());
        assert!(before.get("p-2").is_none());
        assert!(after.get("p-1").is_none());
        assert!(after.get("p-2").is_some());
    }

    #[tokio::test]
    async fn test_duplicate_profiles_collapse_before_dispatch() {
        let broker = Arc::new(MockBroker::new());
        let director = Director::new(broker.clone(), "Request".to_string());

        // same uuid twice: last writer wins, fan-out sees one profile
        director.refresh_profiles(
            vec![profile("p-1", 4), profile("p-1", 2)]
                .into_iter()
                .collect(),
        );

        let summary = director.dispatch(transaction("T1")).await;
        assert_eq!(summary.profiles, 1);
        assert_eq!(summary.pairs_published, 2);
    }
}

//! Daily credit reset: every active subscription on a plan flagged
//! `daily_credit_reset` gets its balance restored to the plan's allotment.

use serde::Serialize;

use crate::JobError;
use crate::store::CreditLedger;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CreditResetReport {
    pub plans_processed: u64,
    pub subscriptions_updated: u64,
    /// Subscriptions (or whole plans) that could not be reset.
    pub failures: u64,
}

impl CreditResetReport {
    pub fn message(&self) -> String {
        format!(
            "Reset credits for {} subscriptions across {} plans",
            self.subscriptions_updated, self.plans_processed
        )
    }
}

/// Run the reset. Only listing the plans can fail the run.
pub async fn run<L>(ledger: &L) -> Result<CreditResetReport, JobError>
where
    L: CreditLedger + ?Sized,
{
    let plans = ledger.list_reset_plans().await.map_err(JobError::ListPlans)?;
    tracing::info!(plans = plans.len(), "Starting daily credit reset");

    let mut report = CreditResetReport::default();

    for plan in &plans {
        let subscriptions = match ledger.list_active_subscriptions(plan.id).await {
            Ok(subs) => subs,
            Err(e) => {
                tracing::error!(plan = %plan.slug, error = %e, "Failed to list subscriptions, skipping plan");
                report.failures += 1;
                continue;
            }
        };

        for sub in &subscriptions {
            match ledger.reset_subscription_credits(sub.id, plan.credits).await {
                Ok(true) => report.subscriptions_updated += 1,
                Ok(false) => {
                    tracing::debug!(subscription_id = %sub.id, "Subscription no longer active, skipped");
                }
                Err(e) => {
                    tracing::error!(
                        subscription_id = %sub.id,
                        plan = %plan.slug,
                        error = %e,
                        "Failed to reset subscription credits"
                    );
                    report.failures += 1;
                }
            }
        }

        report.plans_processed += 1;
        tracing::debug!(plan = %plan.slug, subscriptions = subscriptions.len(), credits = plan.credits, "Plan reset");
    }

    tracing::info!(
        plans_processed = report.plans_processed,
        subscriptions_updated = report.subscriptions_updated,
        failures = report.failures,
        "Daily credit reset finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;
    use stockpilot_common::models::{PricingPlan, Subscription, SubscriptionStatus};
    use uuid::Uuid;

    #[derive(Default)]
    struct FakeLedger {
        plans: Vec<PricingPlan>,
        subscriptions: Mutex<Vec<Subscription>>,
        broken_plans: HashSet<Uuid>,
        broken_subscriptions: HashSet<Uuid>,
        fail_plans: bool,
    }

    #[async_trait]
    impl CreditLedger for FakeLedger {
        async fn list_reset_plans(&self) -> anyhow::Result<Vec<PricingPlan>> {
            if self.fail_plans {
                anyhow::bail!("connection refused");
            }
            Ok(self.plans.iter().filter(|p| p.daily_credit_reset).cloned().collect())
        }

        async fn list_active_subscriptions(
            &self,
            plan_id: Uuid,
        ) -> anyhow::Result<Vec<Subscription>> {
            if self.broken_plans.contains(&plan_id) {
                anyhow::bail!("statement timeout");
            }
            let subs = self.subscriptions.lock().unwrap();
            Ok(subs
                .iter()
                .filter(|s| s.plan_id == plan_id && s.status == SubscriptionStatus::Active)
                .cloned()
                .collect())
        }

        async fn reset_subscription_credits(
            &self,
            subscription_id: Uuid,
            credits: i32,
        ) -> anyhow::Result<bool> {
            if self.broken_subscriptions.contains(&subscription_id) {
                anyhow::bail!("row locked");
            }
            let mut subs = self.subscriptions.lock().unwrap();
            match subs
                .iter_mut()
                .find(|s| s.id == subscription_id && s.status == SubscriptionStatus::Active)
            {
                Some(sub) => {
                    sub.credits_remaining = credits;
                    sub.credits_total = credits;
                    Ok(true)
                }
                None => Ok(false),
            }
        }
    }

    fn plan(slug: &str, credits: i32, daily: bool) -> PricingPlan {
        PricingPlan {
            id: Uuid::new_v4(),
            name: slug.to_uppercase(),
            slug: slug.into(),
            price_cents: 0,
            credits,
            daily_credit_reset: daily,
            is_active: true,
            sort_order: 0,
            created_at: Utc::now(),
        }
    }

    fn subscription(plan: &PricingPlan, status: SubscriptionStatus, remaining: i32) -> Subscription {
        let now = Utc::now();
        Subscription {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            plan_id: plan.id,
            status,
            credits_remaining: remaining,
            credits_total: plan.credits,
            current_period_end: None,
            created_at: now,
            updated_at: now,
            canceled_at: None,
        }
    }

    fn balances(ledger: &FakeLedger) -> HashMap<Uuid, (i32, i32)> {
        ledger
            .subscriptions
            .lock()
            .unwrap()
            .iter()
            .map(|s| (s.id, (s.credits_remaining, s.credits_total)))
            .collect()
    }

    #[tokio::test]
    async fn only_active_subscriptions_on_daily_plans_are_reset() {
        let free = plan("free", 5, true);
        let pro = plan("pro", 500, false);
        let active_free = subscription(&free, SubscriptionStatus::Active, 1);
        let canceled_free = subscription(&free, SubscriptionStatus::Canceled, 0);
        let active_pro = subscription(&pro, SubscriptionStatus::Active, 42);

        let ledger = FakeLedger {
            plans: vec![free, pro],
            subscriptions: Mutex::new(vec![
                active_free.clone(),
                canceled_free.clone(),
                active_pro.clone(),
            ]),
            ..Default::default()
        };

        let report = run(&ledger).await.unwrap();
        assert_eq!(
            report,
            CreditResetReport {
                plans_processed: 1,
                subscriptions_updated: 1,
                failures: 0,
            }
        );

        let after = balances(&ledger);
        assert_eq!(after[&active_free.id], (5, 5));
        assert_eq!(after[&canceled_free.id], (0, 5));
        assert_eq!(after[&active_pro.id], (42, 500));
    }

    #[tokio::test]
    async fn per_subscription_failures_are_skipped() {
        let free = plan("free", 10, true);
        let broken = subscription(&free, SubscriptionStatus::Active, 2);
        let healthy = subscription(&free, SubscriptionStatus::Active, 3);

        let ledger = FakeLedger {
            plans: vec![free],
            subscriptions: Mutex::new(vec![broken.clone(), healthy.clone()]),
            broken_subscriptions: HashSet::from([broken.id]),
            ..Default::default()
        };

        let report = run(&ledger).await.unwrap();
        assert_eq!(report.subscriptions_updated, 1);
        assert_eq!(report.failures, 1);

        let after = balances(&ledger);
        assert_eq!(after[&broken.id], (2, 10));
        assert_eq!(after[&healthy.id], (10, 10));
    }

    #[tokio::test]
    async fn plan_listing_failure_skips_that_plan() {
        let a = plan("daily-a", 3, true);
        let b = plan("daily-b", 7, true);
        let sub_b = subscription(&b, SubscriptionStatus::Active, 0);

        let ledger = FakeLedger {
            broken_plans: HashSet::from([a.id]),
            plans: vec![a, b],
            subscriptions: Mutex::new(vec![sub_b.clone()]),
            ..Default::default()
        };

        let report = run(&ledger).await.unwrap();
        assert_eq!(report.plans_processed, 1);
        assert_eq!(report.subscriptions_updated, 1);
        assert_eq!(report.failures, 1);
        assert_eq!(balances(&ledger)[&sub_b.id], (7, 7));
    }

    #[tokio::test]
    async fn listing_plans_failure_is_fatal() {
        let ledger = FakeLedger {
            fail_plans: true,
            ..Default::default()
        };
        assert!(matches!(run(&ledger).await, Err(JobError::ListPlans(_))));
    }
}

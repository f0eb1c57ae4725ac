//! Storage seams used by the jobs, with their PostgreSQL and S3 implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use stockpilot_common::models::{ExpiredGeneration, PricingPlan, Subscription};
use stockpilot_db::Database;
use stockpilot_db::repository::{generations, plans, subscriptions};
use stockpilot_db::storage::{BatchDelete, StorageClient};
use uuid::Uuid;

/// Generation rows as seen by the cleanup job.
#[async_trait]
pub trait GenerationStore: Send + Sync {
    async fn list_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> anyhow::Result<Vec<ExpiredGeneration>>;

    /// Delete the `generation_marketplaces` rows pointing at `ids`.
    async fn delete_marketplace_links(&self, ids: &[Uuid]) -> anyhow::Result<u64>;

    async fn delete_generations(&self, ids: &[Uuid]) -> anyhow::Result<u64>;
}

/// Object storage holding uploaded generation files.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Map a stored file's public URL to its object key.
    fn key_from_url(&self, url: &str) -> Option<String>;

    async fn delete_objects(&self, keys: &[String]) -> anyhow::Result<BatchDelete>;
}

/// Plans and subscription balances as seen by the credit-reset job.
#[async_trait]
pub trait CreditLedger: Send + Sync {
    async fn list_reset_plans(&self) -> anyhow::Result<Vec<PricingPlan>>;

    async fn list_active_subscriptions(&self, plan_id: Uuid) -> anyhow::Result<Vec<Subscription>>;

    /// Set both `credits_remaining` and `credits_total`. `false` when the
    /// subscription is no longer active.
    async fn reset_subscription_credits(
        &self,
        subscription_id: Uuid,
        credits: i32,
    ) -> anyhow::Result<bool>;
}

#[async_trait]
impl GenerationStore for Database {
    async fn list_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> anyhow::Result<Vec<ExpiredGeneration>> {
        Ok(generations::list_created_before(&self.pg, cutoff).await?)
    }

    async fn delete_marketplace_links(&self, ids: &[Uuid]) -> anyhow::Result<u64> {
        Ok(generations::delete_marketplace_links(&self.pg, ids).await?)
    }

    async fn delete_generations(&self, ids: &[Uuid]) -> anyhow::Result<u64> {
        Ok(generations::delete_by_ids(&self.pg, ids).await?)
    }
}

#[async_trait]
impl CreditLedger for Database {
    async fn list_reset_plans(&self) -> anyhow::Result<Vec<PricingPlan>> {
        Ok(plans::list_daily_reset(&self.pg).await?)
    }

    async fn list_active_subscriptions(&self, plan_id: Uuid) -> anyhow::Result<Vec<Subscription>> {
        Ok(subscriptions::list_active_for_plan(&self.pg, plan_id).await?)
    }

    async fn reset_subscription_credits(
        &self,
        subscription_id: Uuid,
        credits: i32,
    ) -> anyhow::Result<bool> {
        Ok(subscriptions::reset_credits(&self.pg, subscription_id, credits).await?)
    }
}

#[async_trait]
impl ObjectStore for StorageClient {
    fn key_from_url(&self, url: &str) -> Option<String> {
        StorageClient::key_from_url(self, url)
    }

    async fn delete_objects(&self, keys: &[String]) -> anyhow::Result<BatchDelete> {
        StorageClient::delete_objects(self, keys).await
    }
}

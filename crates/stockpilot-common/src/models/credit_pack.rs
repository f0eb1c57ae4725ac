//! Credit packs: one-time purchasable credit bundles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CreditPack {
    pub id: Uuid,
    pub name: String,
    pub credits: i32,
    pub price_cents: i32,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

/// A settled credit-pack purchase. `payment_reference` is unique, so a
/// gateway notification can be replayed without crediting twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CreditPurchase {
    pub id: Uuid,
    pub user_id: Uuid,
    pub pack_id: Uuid,
    pub credits: i32,
    pub payment_reference: String,
    pub created_at: DateTime<Utc>,
}

/// Purchase notification forwarded once the payment gateway confirms a checkout.
#[derive(Debug, Deserialize, Validate)]
pub struct PurchaseCreditsRequest {
    pub user_id: Uuid,
    pub pack_id: Uuid,
    #[validate(length(min = 1, max = 255, message = "payment_reference must be 1-255 characters"))]
    pub payment_reference: String,
}

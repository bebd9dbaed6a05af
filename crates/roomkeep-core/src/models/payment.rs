//! Payment domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub reservation_id: Uuid,
    pub amount_cents: u64,
    pub cardholder_name: String,
    pub bank_name: String,
    pub card_last4: String,
    /// `MM/YY` as entered at checkout.
    pub card_expiry: String,
    /// AES-256-GCM sealed card number, when a sealing key is configured.
    #[serde(skip_serializing)]
    pub sealed_card_number: Option<String>,
    pub paid_at: DateTime<Utc>,
}

/// Payment details written alongside a reservation at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPayment {
    pub amount_cents: u64,
    pub cardholder_name: String,
    pub bank_name: String,
    pub card_last4: String,
    pub card_expiry: String,
    pub sealed_card_number: Option<String>,
}

/// Admin overwrite of a stored payment.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdatePayment {
    pub amount_cents: Option<u64>,
    pub cardholder_name: Option<String>,
    pub bank_name: Option<String>,
}

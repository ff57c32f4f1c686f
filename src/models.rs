use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub user_id: i64,
    pub category: String,
    pub currency: String,
}

/// One statement row accepted by a parser, not yet persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedRecord {
    #[serde(default = "Uuid::new_v4")]
    pub temp_id: Uuid,
    pub amount: Decimal,
    pub balance: Decimal,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    /// Position among records sharing the same timestamp, starting at 0.
    pub order: u32,
}

impl ParsedRecord {
    pub fn new(
        timestamp: DateTime<Utc>,
        amount: Decimal,
        balance: Decimal,
        description: String,
        order: u32,
    ) -> Self {
        Self {
            temp_id: Uuid::new_v4(),
            amount,
            balance,
            timestamp,
            description,
            order,
        }
    }
}

/// The span of timestamps already stored for an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub oldest: DateTime<Utc>,
    pub newest: DateTime<Utc>,
}

impl DateRange {
    /// Both ends are inclusive.
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        self.oldest <= timestamp && timestamp <= self.newest
    }
}

/// A transaction ready to be inserted for a resolved account.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub account_id: i64,
    pub timestamp: DateTime<Utc>,
    pub amount: Decimal,
    pub balance: Decimal,
    pub description: String,
    pub transaction_category_id: i64,
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: i64,
    pub account_id: i64,
    pub timestamp: DateTime<Utc>,
    pub amount: Decimal,
    pub balance: Decimal,
    pub description: String,
    pub transaction_category_id: i64,
    pub order: u32,
    pub import_id: Option<i64>,
}

//! Supplier and supplier invoice states

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplierState {
    Active,
    Inactive,
}

impl SupplierState {
    pub const ALL: [SupplierState; 2] = [SupplierState::Active, SupplierState::Inactive];

    pub fn as_str(&self) -> &'static str {
        match self {
            SupplierState::Active => "active",
            SupplierState::Inactive => "inactive",
        }
    }
}

text_enum!(SupplierState, "supplier state");

/// Whether the goods on an invoice have entered inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceptionState {
    Pending,
    Received,
}

impl ReceptionState {
    pub const ALL: [ReceptionState; 2] = [ReceptionState::Pending, ReceptionState::Received];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReceptionState::Pending => "pending",
            ReceptionState::Received => "received",
        }
    }
}

text_enum!(ReceptionState, "reception state");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Pending,
    Paid,
}

impl PaymentState {
    pub const ALL: [PaymentState; 2] = [PaymentState::Pending, PaymentState::Paid];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentState::Pending => "pending",
            PaymentState::Paid => "paid",
        }
    }
}

text_enum!(PaymentState, "payment state");

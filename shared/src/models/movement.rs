//! Kardex (inventory movement) vocabulary

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementDirection {
    In,
    Out,
}

impl MovementDirection {
    pub const ALL: [MovementDirection; 2] = [MovementDirection::In, MovementDirection::Out];

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementDirection::In => "in",
            MovementDirection::Out => "out",
        }
    }
}

text_enum!(MovementDirection, "movement direction");

/// Business event that caused a movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementOrigin {
    Opening,
    Purchase,
    Sale,
    Adjustment,
    Merma,
    Return,
}

impl MovementOrigin {
    pub const ALL: [MovementOrigin; 6] = [
        MovementOrigin::Opening,
        MovementOrigin::Purchase,
        MovementOrigin::Sale,
        MovementOrigin::Adjustment,
        MovementOrigin::Merma,
        MovementOrigin::Return,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementOrigin::Opening => "opening",
            MovementOrigin::Purchase => "purchase",
            MovementOrigin::Sale => "sale",
            MovementOrigin::Adjustment => "adjustment",
            MovementOrigin::Merma => "merma",
            MovementOrigin::Return => "return",
        }
    }
}

text_enum!(MovementOrigin, "movement origin");

/// Document a movement links back to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    Adjustment,
    SupplierInvoice,
    Sale,
}

impl ReferenceType {
    pub const ALL: [ReferenceType; 3] = [
        ReferenceType::Adjustment,
        ReferenceType::SupplierInvoice,
        ReferenceType::Sale,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceType::Adjustment => "adjustment",
            ReferenceType::SupplierInvoice => "supplier_invoice",
            ReferenceType::Sale => "sale",
        }
    }
}

text_enum!(ReferenceType, "reference type");

/// Link from a movement to the document that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovementReference {
    pub kind: ReferenceType,
    pub id: uuid::Uuid,
}

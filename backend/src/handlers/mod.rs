//! HTTP handlers

pub mod alert;
pub mod auth;
pub mod health;
pub mod invoice;
pub mod merma;
pub mod movement;
pub mod product;
pub mod report;
pub mod sale;
pub mod stock;
pub mod supplier;

pub use alert::*;
pub use auth::*;
pub use health::*;
pub use invoice::*;
pub use merma::*;
pub use movement::*;
pub use product::*;
pub use report::*;
pub use sale::*;
pub use stock::*;
pub use supplier::*;

/// Business day used for expiry windows and daily figures
pub(crate) fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

//! Domain models for the Fornería platform

mod access;
mod alert;
mod lot;
mod movement;
mod pricing;
mod product;
mod sale;
mod supplier;

pub use access::*;
pub use alert::*;
pub use lot::*;
pub use movement::*;
pub use pricing::*;
pub use product::*;
pub use sale::*;
pub use supplier::*;

//! Business logic services for the Fornería backend

pub mod alert;
pub mod auth;
pub mod invoice;
pub mod merma;
pub mod movement;
pub mod product;
pub mod reporting;
pub mod sale;
pub mod stock;
pub mod supplier;

pub use alert::AlertService;
pub use auth::AuthService;
pub use invoice::InvoiceService;
pub use merma::MermaService;
pub use movement::MovementService;
pub use product::ProductService;
pub use reporting::ReportingService;
pub use sale::SaleService;
pub use stock::StockService;
pub use supplier::SupplierService;

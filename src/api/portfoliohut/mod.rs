pub mod client;
pub mod models;

pub use client::PortfolioHutClient;
pub use models::{ApiError, Endpoint};

pub use pushkind_common::services::errors::{ServiceError, ServiceResult};

pub mod cart;
pub mod checkout;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod storefront;

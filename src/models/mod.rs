//! Diesel row types and their conversions to and from the domain layer.

pub mod order;
pub mod product;

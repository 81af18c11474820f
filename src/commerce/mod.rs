//! Relational accessors for the store-platform data: customers, products,
//! orders, Q&A, reviews, settlement and CS manuals, plus derived aggregates.

pub mod models;
pub mod serialize;
mod store;
pub mod warnings;

#[cfg(test)]
pub mod fixtures;

pub use models::{
    AdminKpis, CommerceSnapshot, CsManual, Customer, MarginReport, Order, Product, Qna, Review,
    SalesPoint, SettlementDay,
};
pub use store::CommerceStore;
pub use warnings::{compute_warnings, Warning, WarningRules};

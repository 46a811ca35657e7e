pub mod auth;
pub mod consent;
pub mod signature;
pub mod transactions;

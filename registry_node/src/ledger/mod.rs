pub mod store;
pub mod transaction;

pub use store::TransactionStore;
pub use transaction::*;

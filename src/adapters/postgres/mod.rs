//! PostgreSQL adapters.

mod entry_tracker;
mod order_store;

pub use entry_tracker::PgEntryTracker;
pub use order_store::PgOrderStore;

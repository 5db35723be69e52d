//! Identity lookup implementations.

mod offline;
mod static_table;

pub use offline::OfflineLookup;
pub use static_table::StaticLookup;

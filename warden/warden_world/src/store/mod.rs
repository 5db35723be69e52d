//! Storage backends.
//!
//! Both backends implement [`warden_core::traits::Storage`]. Internal errors
//! are logged here and reported to the world as plain failure.

mod file;
mod in_memory;

pub use file::JsonFileStore;
pub use in_memory::InMemoryStore;

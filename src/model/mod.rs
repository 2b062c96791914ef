pub mod api;
pub mod auth;
pub mod common;
pub mod db;
pub mod memory;
pub mod mongodb;
pub mod store;

pub use memory::MemoryStore;
pub use store::{ElectionStore, Store};

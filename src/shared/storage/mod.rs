pub mod file_store;
pub mod key_value_store;
pub mod memory_store;

pub use file_store::FileStore;
pub use key_value_store::{KeyValueStore, StoreError};
pub use memory_store::MemoryStore;

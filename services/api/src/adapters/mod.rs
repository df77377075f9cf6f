pub mod file_store;
pub mod memory_store;
pub mod notifier;

pub use file_store::JsonFileStore;
pub use memory_store::MemoryStore;
pub use notifier::{BroadcastNotifier, NotifyingStore};

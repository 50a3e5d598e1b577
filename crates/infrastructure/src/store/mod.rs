mod file_store;
mod memory_store;

pub use file_store::FileAddressStore;
pub use memory_store::MemoryAddressStore;

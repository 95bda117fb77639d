pub mod auto;
pub mod local;
pub mod memory;

pub use auto::open_storage;
pub use local::LocalStorage;
pub use memory::MemoryStorage;

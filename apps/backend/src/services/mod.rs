pub mod locks;
pub mod memory;
pub mod scheduler;
pub mod store;

pub mod memory;
pub mod mongo;

pub use memory::MemoryCompanyStore;
pub use mongo::MongoCompanyStore;

pub mod store;
pub mod redis_store;
pub mod factory;

pub use store::*;
pub use redis_store::RedisStore;
pub use factory::{create_store, create_in_memory_store};

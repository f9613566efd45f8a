pub mod pool;
pub mod store;

pub use pool::{ClassLevel, ContentPool, ItemKind, PracticeItem};
pub use store::{BundledContent, ContentStore, JsonContentStore};

pub mod money;
pub mod store;
pub mod text;
pub mod transaction;

pub use money::Money;
pub use store::{KeyValueStore, MemoryStore, StoreError};
pub use text::{extract_merchant, normalize, normalize_opt, tokenize};
pub use transaction::Transaction;

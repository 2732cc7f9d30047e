pub mod store;
pub mod types;

pub use store::{ConfigSnapshot, ConfigStore};
pub use types::{ConfigPatch, ProviderConfig};

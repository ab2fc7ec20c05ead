pub mod address_cache;
pub mod store_locator;

pub use address_cache::{CsvAddressCache, InMemoryAddressCache};
pub use store_locator::{OfflineLookup, StoreLocator};

pub mod clock;
pub mod error;
pub mod kind;
pub mod schema;
pub mod store;
#[cfg(test)]
mod test;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::*;
pub use kind::*;
pub use store::{CacheStats, CacheStore, EvictionReport, TableStats};

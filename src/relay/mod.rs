//! Session relay: short-lived handles for image payloads crossing a navigation.

pub mod clock;
pub mod memory;
pub mod traits;

pub use clock::{Clock, ManualClock, SystemClock};
pub use memory::{MemoryRelay, spawn_sweeper};
pub use traits::{RelayEntry, RelayStore};

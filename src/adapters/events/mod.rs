//! Event bus adapters.
//!
//! - `InMemoryEventBus` - in-process bus dispatching to registered handlers

mod in_memory;

pub use in_memory::InMemoryEventBus;

//! Property observation with coalesced, turn-based delivery
//!
//! This module provides explicit change-tracking primitives for UI state:
//!
//! - [`Target`]: an observed record of named properties (`get`/`set`)
//! - [`List`]: an observed ordered collection whose appends are reported
//!   to the observers of the property holding it
//! - [`Notifier`]: the hub holding observer registrations
//! - [`Scheduler`]: decides when the next event-loop turn runs
//!
//! # Delivery
//!
//! Mutations never call observers directly. The first mutation in a turn
//! schedules a flush; further mutations of the same property before the flush
//! are merged into one [`Change`] carrying the final value and the value from
//! before the first mutation. Observers never see intermediate states.
//!
//! # Invariants
//!
//! 1. Callbacks of one notification run in registration order.
//! 2. Every registration fires, including duplicates of the same callback.
//! 3. [`Notifier::set_silently`] never reaches an observer of that property.
//! 4. After [`Notifier::unobserve_all`] no callback registered on the target
//!    runs again, including for changes already pending.
//! 5. Assigning the value a property already holds is a no-op.

mod notifier;
mod scheduler;
mod target;
mod value;

#[cfg(test)]
mod tests;

pub use notifier::{Change, ChangeKind, Notifier, ObserverId, WILDCARD};
pub use scheduler::{LocalScheduler, ManualScheduler, Scheduler, Task};
pub use target::{List, Target};
pub use value::Value;

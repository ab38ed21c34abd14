//! Reusable display helpers shared by screens.

pub mod format;
pub mod resource_gauge;

pub mod attendance;
pub mod employee;
pub mod metrics;
pub mod punch;
pub mod roster;

pub mod attendance;
pub mod metrics;
pub mod roster;

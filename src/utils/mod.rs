pub mod employee_filter;
pub mod metrics_cache;

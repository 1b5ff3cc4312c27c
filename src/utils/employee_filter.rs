use std::sync::{Arc, PoisonError, RwLock};

use anyhow::Result;
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;

use crate::store::EmployeeRegistry;

/// Expected capacity and false-positive rate.
/// Tune these based on real headcount.
const FILTER_CAPACITY: usize = 50_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

#[inline]
fn normalize(employee_code: &str) -> String {
    employee_code.trim().to_uppercase()
}

/// Negative cache of active employee codes.
///
/// A miss on a warm filter rejects a code without touching the registry.
/// A hit is only a maybe and callers still confirm it. Until the first
/// warmup the filter is cold and answers nothing. Codes activated after a
/// warmup are admitted from the next refresh on.
#[derive(Clone, Default)]
pub struct EmployeeFilter {
    inner: Arc<RwLock<Option<CuckooFilter<String>>>>,
}

impl EmployeeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_warm(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// True only when the filter is warm and has never seen the code.
    pub fn definitely_absent(&self, employee_code: &str) -> bool {
        let code = normalize(employee_code);
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|filter| !filter.contains(&code))
    }

    /// Rebuilds the filter from the registry's active codes and swaps it in,
    /// so deactivated employees drop out. The old filter keeps serving until
    /// the new one is complete.
    pub async fn warmup(&self, registry: &dyn EmployeeRegistry) -> Result<usize> {
        let mut fresh = CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE);
        let mut loaded = 0usize;

        let mut codes = registry.active_employee_codes();
        while let Some(code) = codes.next().await {
            fresh.add(&normalize(&code?));
            loaded += 1;
        }

        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(fresh);

        log::info!("Employee filter warmup complete: {} employees", loaded);
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::employee::employee;
    use crate::store::memory::MemoryStore;

    #[actix_web::test]
    async fn warmup_loads_active_codes() {
        let mut gone = employee("FILTER-GONE", "Old", "Ops");
        gone.is_active = false;
        let store = MemoryStore::new(2, 0)
            .with_employees(vec![employee("filter-e1", "Asad", "Finance"), gone]);
        let filter = EmployeeFilter::new();

        assert!(!filter.definitely_absent("FILTER-GONE"));

        let loaded = filter.warmup(&store).await.unwrap();

        assert_eq!(loaded, 1);
        assert!(filter.is_warm());
        assert!(!filter.definitely_absent("FILTER-E1"));
        assert!(!filter.definitely_absent(" filter-e1 "));
        assert!(filter.definitely_absent("FILTER-GONE"));
    }

    #[actix_web::test]
    async fn rebuild_drops_deactivated_codes() {
        let before = MemoryStore::new(2, 0).with_employees(vec![
            employee("FILTER-KEEP", "Asad", "Finance"),
            employee("FILTER-LEFT", "Bilal", "Support"),
        ]);
        let mut left = employee("FILTER-LEFT", "Bilal", "Support");
        left.is_active = false;
        let after = MemoryStore::new(1, 0)
            .with_employees(vec![employee("FILTER-KEEP", "Asad", "Finance"), left]);

        let filter = EmployeeFilter::new();
        filter.warmup(&before).await.unwrap();
        assert!(!filter.definitely_absent("FILTER-LEFT"));

        filter.warmup(&after).await.unwrap();
        assert!(filter.definitely_absent("FILTER-LEFT"));
        assert!(!filter.definitely_absent("FILTER-KEEP"));
    }
}

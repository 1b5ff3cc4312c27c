use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use moka::future::Cache;

use crate::model::metrics::AttendanceMetrics;

/// (requested date, clock truncated to the TTL bucket)
type CacheKey = (NaiveDate, i64);

/// Short-lived cache in front of the metrics engine.
///
/// Keys carry the date the caller asked for, not the date the engine fell
/// back to, so a day that starts receiving punches is picked up as soon as
/// the bucket turns over.
#[derive(Clone)]
pub struct MetricsCache {
    inner: Option<Cache<CacheKey, AttendanceMetrics>>,
    bucket_secs: i64,
}

impl MetricsCache {
    /// A TTL of zero disables caching.
    pub fn new(ttl_secs: u64) -> Self {
        let inner = (ttl_secs > 0).then(|| {
            Cache::builder()
                .max_capacity(1_000)
                .time_to_live(Duration::from_secs(ttl_secs))
                .build()
        });

        Self {
            inner,
            bucket_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX).max(1),
        }
    }

    fn key(&self, date: NaiveDate, now: NaiveDateTime) -> CacheKey {
        (date, now.and_utc().timestamp().div_euclid(self.bucket_secs))
    }

    pub async fn get_or_compute<F, Fut>(
        &self,
        date: NaiveDate,
        now: NaiveDateTime,
        compute: F,
    ) -> Result<AttendanceMetrics>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<AttendanceMetrics>>,
    {
        let Some(cache) = &self.inner else {
            return compute().await;
        };

        let key = self.key(date, now);
        if let Some(hit) = cache.get(&key).await {
            return Ok(hit);
        }

        let metrics = compute().await?;
        cache.insert(key, metrics.clone()).await;
        Ok(metrics)
    }

    /// Drop everything, e.g. after a punch was written.
    pub fn invalidate_all(&self) {
        if let Some(cache) = &self.inner {
            cache.invalidate_all();
        }
    }
}

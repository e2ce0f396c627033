use moka::future::Cache;
use once_cell::sync::Lazy;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::summary::EmployeePtoSummary;

/// Computed summaries per calendar year. The TTL stands in for the old
/// 5-minute polling refresh; decisions and submissions invalidate the
/// affected year eagerly so managers never act on a stale balance.
pub static SUMMARY_CACHE: Lazy<Cache<i32, Arc<Vec<EmployeePtoSummary>>>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(16) // a handful of years at most
        .time_to_live(Duration::from_secs(300))
        .build()
});

pub async fn get(year: i32) -> Option<Arc<Vec<EmployeePtoSummary>>> {
    SUMMARY_CACHE.get(&year).await
}

pub async fn put(year: i32, summaries: Vec<EmployeePtoSummary>) -> Arc<Vec<EmployeePtoSummary>> {
    let shared = Arc::new(summaries);
    SUMMARY_CACHE.insert(year, shared.clone()).await;
    shared
}

pub async fn invalidate(year: i32) {
    SUMMARY_CACHE.invalidate(&year).await;
}

use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::RwLock;

use crate::model::employee::normalize_mobile;

/// Expected capacity and false-positive rate.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

static MOBILE_FILTER: Lazy<RwLock<CuckooFilter<String>>> =
    Lazy::new(|| RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)));

/// Check if a mobile number might be registered (false positives possible)
pub fn might_exist(mobile: &str) -> bool {
    let mobile = normalize_mobile(mobile);
    match MOBILE_FILTER.read() {
        Ok(filter) => filter.contains(&mobile),
        // a poisoned filter can't rule anything out
        Err(_) => true,
    }
}

pub fn insert(mobile: &str) {
    let mobile = normalize_mobile(mobile);
    if let Ok(mut filter) = MOBILE_FILTER.write() {
        filter.add(&mobile);
    }
}

pub fn remove(mobile: &str) {
    let mobile = normalize_mobile(mobile);
    if let Ok(mut filter) = MOBILE_FILTER.write() {
        filter.remove(&mobile);
    }
}

/// Warm up the filter from the employees table using streaming + batching
pub async fn warmup_mobile_filter(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String,)>("SELECT mobile FROM employees").fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (mobile,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

        batch.push(normalize_mobile(&mobile));
        total += 1;

        if batch.len() == batch_size {
            insert_batch(&batch);
            batch.clear();
        }
    }

    if !batch.is_empty() {
        insert_batch(&batch);
    }

    log::info!("Mobile filter warmup complete: {} employees", total);
    Ok(())
}

fn insert_batch(mobiles: &[String]) {
    if let Ok(mut filter) = MOBILE_FILTER.write() {
        for mobile in mobiles {
            filter.add(mobile);
        }
    }
}

use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

/// Registered mobile numbers seen recently. Presence means TAKEN.
pub static MOBILE_CACHE: Lazy<Cache<String, bool>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(500_000)
        .time_to_live(Duration::from_secs(86400)) // 24h TTL
        .build()
});

pub async fn mark_taken(mobile: &str) {
    MOBILE_CACHE.insert(mobile.to_string(), true).await;
}

pub async fn is_taken(mobile: &str) -> bool {
    MOBILE_CACHE.get(mobile).await.unwrap_or(false)
}

pub async fn forget(mobile: &str) {
    MOBILE_CACHE.invalidate(mobile).await;
}

async fn batch_mark(mobiles: &[String]) {
    let futures: Vec<_> = mobiles
        .iter()
        .map(|m| MOBILE_CACHE.insert(m.clone(), true))
        .collect();

    futures::future::join_all(futures).await;
}

/// Load mobiles of employees who logged in during the last `days` days (batched)
pub async fn warmup_mobile_cache(pool: &MySqlPool, days: u32, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String,)>(
        r#"
        SELECT mobile
        FROM employees
        WHERE last_login_at >= NOW() - INTERVAL ? DAY
        ORDER BY last_login_at DESC
        "#,
    )
    .bind(days)
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let (mobile,) = row?;
        batch.push(mobile);
        total_count += 1;

        if batch.len() >= batch_size {
            batch_mark(&batch).await;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        batch_mark(&batch).await;
    }

    log::info!(
        "Mobile cache warmup complete: {} recent employees (last {} days)",
        total_count,
        days
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn marked_numbers_are_taken_until_forgotten() {
        let mobile = "9100000001";
        assert!(!is_taken(mobile).await);

        mark_taken(mobile).await;
        assert!(is_taken(mobile).await);

        forget(mobile).await;
        assert!(!is_taken(mobile).await);
    }
}

use std::future::Future;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};

use crate::service::{PriceMonitor, RefreshSummary};

/// One refresh run; failures are logged rather than returned.
pub async fn refresh_once(monitor: &PriceMonitor) -> Option<RefreshSummary> {
    match monitor.refresh_product_information().await {
        Ok(summary) => {
            tracing::info!(refreshed = summary.refreshed, failed = summary.failed, "cron finished");
            Some(summary)
        }
        Err(err) => {
            tracing::error!("cron refresh failed: {}", err);
            None
        }
    }
}

/// Refreshes every `period` until ctrl-c.
pub async fn run(monitor: &PriceMonitor, period: Duration) -> anyhow::Result<()> {
    run_until(monitor, period, tokio::signal::ctrl_c()).await?;
    Ok(())
}

/// Refreshes every `period` until `shutdown` resolves. A refresh still in
/// flight at that point is abandoned.
pub async fn run_until<F, T>(monitor: &PriceMonitor, period: Duration, shutdown: F) -> T
where
    F: Future<Output = T>,
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tracing::info!("cron started, refreshing every {:?}", period);

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                tokio::select! {
                    _ = refresh_once(monitor) => {}
                    out = &mut shutdown => {
                        tracing::info!("cron stopped during a refresh");
                        return out;
                    }
                }
            }
            out = &mut shutdown => {
                tracing::info!("cron stopped");
                return out;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use crate::config::Settings;
    use crate::database::Database;
    use crate::error::Result;
    use crate::fetch::ProductSource;
    use crate::model::ProductPayload;

    /// A shop that accepts the connection and never answers.
    #[derive(Default)]
    struct StalledSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ProductSource for StalledSource {
        async fn fetch_product(&self, _link: &str) -> Result<ProductPayload> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::future::pending().await
        }
    }

    async fn monitor_with(source: Arc<StalledSource>) -> PriceMonitor {
        let db = Database::in_memory().await.unwrap();
        db.upsert_product(&ProductPayload {
            name: "Kopi".to_string(),
            current_price: 100,
            original_price: 120,
            url: "http://shop.example/kopi".to_string(),
            images: Vec::new(),
        })
        .await
        .unwrap();
        PriceMonitor::new(Arc::new(db), source, &Settings::default())
    }

    #[tokio::test]
    async fn shutdown_interrupts_a_stalled_refresh() {
        let source = Arc::new(StalledSource::default());
        let monitor = monitor_with(source.clone()).await;

        let shutdown = tokio::time::sleep(Duration::from_millis(50));
        let finished = tokio::time::timeout(
            Duration::from_secs(5),
            run_until(&monitor, Duration::from_secs(3600), shutdown),
        )
        .await;

        assert!(finished.is_ok(), "cron kept running after shutdown");
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn shutdown_output_is_returned() {
        let monitor = monitor_with(Arc::new(StalledSource::default())).await;
        let out = run_until(&monitor, Duration::from_secs(3600), async { 7 }).await;
        assert_eq!(out, 7);
    }
}

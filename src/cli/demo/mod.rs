//! Demo command - memoizes a simulated analytics query

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use clap::Args;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::cache::{CacheKey, Cacheable, ExpirationPolicy};
use crate::domain::DomainError;
use crate::infrastructure::observability::init_metrics;
use crate::{create_facade_with_config, CacheFacade};

/// Arguments for the demo command
#[derive(Args, Clone, Debug)]
pub struct DemoArgs {
    /// Time zone the report is computed in
    #[arg(long, default_value = "UTC")]
    pub time_zone: String,

    /// First day of the reporting window (YYYY-MM-DD)
    #[arg(long, default_value = "2024-01-01")]
    pub start: NaiveDate,

    /// Last day of the reporting window (YYYY-MM-DD)
    #[arg(long, default_value = "2024-01-31")]
    pub end: NaiveDate,

    /// Metric to aggregate
    #[arg(long, default_value = "revenue")]
    pub metric: String,

    /// Number of products in the report; scales the expiration
    #[arg(long, default_value_t = 120)]
    pub products: u64,

    /// Invalidate the entry before the last call
    #[arg(long)]
    pub expire: bool,
}

/// A parameterized analytics query whose result is worth caching
#[derive(Debug, Clone)]
pub struct ProductAnalytics {
    pub time_zone: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub metric: String,
    pub product_count: u64,
}

impl Cacheable for ProductAnalytics {
    fn cache_key(&self) -> Result<CacheKey, DomainError> {
        CacheKey::builder()
            .part("ProductAnalytics")
            .part(self.time_zone.as_str())
            .part(self.start)
            .part(self.end)
            .part(self.metric.as_str())
            .build()
    }

    fn expiration_policy(&self) -> ExpirationPolicy {
        ExpirationPolicy::minute_per_item(self.product_count)
    }
}

impl From<&DemoArgs> for ProductAnalytics {
    fn from(args: &DemoArgs) -> Self {
        Self {
            time_zone: args.time_zone.clone(),
            start: args.start,
            end: args.end,
            metric: args.metric.clone(),
            product_count: args.products,
        }
    }
}

/// Computed analytics result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub metric: String,
    pub value: u64,
}

/// Stand-in for an expensive aggregation; every run yields a new value
#[derive(Debug, Default)]
pub struct AnalyticsEngine {
    runs: AtomicU64,
}

impl AnalyticsEngine {
    pub async fn compute(&self, query: &ProductAnalytics) -> Result<AnalyticsReport, DomainError> {
        if query.end < query.start {
            return Err(DomainError::computation(format!(
                "reporting window ends ({}) before it starts ({})",
                query.end, query.start
            )));
        }

        tokio::time::sleep(Duration::from_millis(200)).await;

        let run = self.runs.fetch_add(1, Ordering::SeqCst);

        Ok(AnalyticsReport {
            metric: query.metric.clone(),
            value: 42 + run,
        })
    }

    pub fn runs(&self) -> u64 {
        self.runs.load(Ordering::SeqCst)
    }
}

/// Run the demo
pub async fn run(args: DemoArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let metrics = init_metrics(&config.observability.metrics);

    let facade = create_facade_with_config(&config).await?;
    let query = ProductAnalytics::from(&args);
    let engine = Arc::new(AnalyticsEngine::default());

    info!(
        key = %query.cache_key()?,
        ttl_secs = query.expiration_policy().resolve()?.as_secs(),
        "Running analytics demo"
    );

    for call in 1..=3 {
        if call == 3 && args.expire {
            let removed = facade.invalidate(&query.cache_key()?).await?;
            println!("call {}: entry invalidated ({})", call, removed);
        }

        let report = fetch_report(&facade, &engine, &query).await?;
        println!(
            "call {}: {} = {} (computations so far: {})",
            call,
            report.metric,
            report.value,
            engine.runs()
        );
    }

    if let Some(metrics) = metrics {
        println!();
        print!("{}", metrics.render());
    }

    Ok(())
}

async fn fetch_report(
    facade: &CacheFacade,
    engine: &AnalyticsEngine,
    query: &ProductAnalytics,
) -> Result<AnalyticsReport, DomainError> {
    facade.fetch(query, || engine.compute(query)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::MockCache;

    fn query() -> ProductAnalytics {
        ProductAnalytics {
            time_zone: "Europe/Berlin".to_string(),
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            metric: "revenue".to_string(),
            product_count: 120,
        }
    }

    #[test]
    fn test_cache_key_components() {
        let key = query().cache_key().unwrap();

        assert_eq!(
            key.as_str(),
            "ProductAnalytics:Europe/Berlin:2024-01-01:2024-01-31:revenue"
        );
    }

    #[test]
    fn test_expiration_scales_with_products() {
        assert_eq!(
            query().expiration_policy().resolve().unwrap(),
            Duration::from_secs(120 * 60)
        );

        let small = ProductAnalytics {
            product_count: 3,
            ..query()
        };
        assert_eq!(
            small.expiration_policy().resolve().unwrap(),
            Duration::from_secs(3600)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_fetch_is_served_from_cache() {
        let store = Arc::new(MockCache::new());
        let facade = CacheFacade::new(store.clone());
        let engine = AnalyticsEngine::default();
        let query = query();

        let first = fetch_report(&facade, &engine, &query).await.unwrap();
        let second = fetch_report(&facade, &engine, &query).await.unwrap();

        assert_eq!(first.value, 42);
        assert_eq!(second, first);
        assert_eq!(engine.runs(), 1);
        assert_eq!(
            store.stored_ttl(query.cache_key().unwrap().as_str()),
            Some(Duration::from_secs(120 * 60))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_window_is_not_cached() {
        let store = Arc::new(MockCache::new());
        let facade = CacheFacade::new(store.clone());
        let engine = AnalyticsEngine::default();
        let query = ProductAnalytics {
            end: NaiveDate::from_ymd_opt(2023, 12, 1).unwrap(),
            ..query()
        };

        let result = fetch_report(&facade, &engine, &query).await;

        assert!(matches!(result, Err(DomainError::Computation { .. })));
        assert!(store.keys().is_empty());
    }
}

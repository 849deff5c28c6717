use chrono::Duration;
use crates::domain::{
    clock::Clock,
    repositories::{cache::Cache, categories::CategoryRepository, query_gateway::QueryGateway},
    value_objects::{
        analytics::{AnalyticsPeriod, AnalyticsSnapshot},
        time_window::{RangeParsing, RangeToken, TimeWindow},
    },
};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    config::config_model::Analytics as AnalyticsConfig,
    usecases::{
        errors::{AnalyticsError, UseCaseResult},
        extended_analytics::ExtendedAnalyticsAssembler,
        metrics::MetricAggregator,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyticsSettings {
    pub range_parsing: RangeParsing,
    pub catalog_ttl: Duration,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self::from(&AnalyticsConfig::default())
    }
}

impl From<&AnalyticsConfig> for AnalyticsSettings {
    fn from(config: &AnalyticsConfig) -> Self {
        Self {
            range_parsing: if config.strict_time_range {
                RangeParsing::Strict
            } else {
                RangeParsing::Lenient
            },
            catalog_ttl: Duration::minutes(config.cache_ttl_minutes),
        }
    }
}

pub struct DashboardAnalyticsUseCase<G, C>
where
    G: QueryGateway + Send + Sync + 'static,
    C: CategoryRepository + Send + Sync + 'static,
{
    gateway: Arc<G>,
    categories: Arc<C>,
    cache: Arc<dyn Cache>,
    clock: Arc<dyn Clock>,
    settings: AnalyticsSettings,
}

impl<G, C> DashboardAnalyticsUseCase<G, C>
where
    G: QueryGateway + Send + Sync + 'static,
    C: CategoryRepository + Send + Sync + 'static,
{
    pub fn new(
        gateway: Arc<G>,
        categories: Arc<C>,
        cache: Arc<dyn Cache>,
        clock: Arc<dyn Clock>,
        settings: AnalyticsSettings,
    ) -> Self {
        Self {
            gateway,
            categories,
            cache,
            clock,
            settings,
        }
    }

    pub async fn get_dashboard_analytics(
        &self,
        time_range: Option<&str>,
        extended: bool,
    ) -> UseCaseResult<AnalyticsSnapshot> {
        let token = RangeToken::parse(time_range, self.settings.range_parsing).map_err(|err| {
            warn!(time_range = ?time_range, error = %err, "analytics: rejected time range");
            AnalyticsError::from(err)
        })?;

        let now = self.clock.now();
        let window = TimeWindow::resolve(token, now).map_err(|err| {
            warn!(time_range = %token.as_token(), error = %err, "analytics: rejected time range");
            AnalyticsError::from(err)
        })?;
        info!(
            time_range = %token.as_token(),
            extended,
            "analytics: dashboard requested"
        );

        let blocks = MetricAggregator::new(self.gateway.as_ref(), &window)
            .collect()
            .await
            .map_err(|err| {
                error!(db_error = ?err, "analytics: failed to aggregate dashboard metrics");
                AnalyticsError::UpstreamQueryFailure(err)
            })?;

        let extended = if extended {
            let assembler = ExtendedAnalyticsAssembler::new(
                self.gateway.as_ref(),
                self.categories.as_ref(),
                self.cache.as_ref(),
                self.settings.catalog_ttl,
                &window,
            );
            let block = assembler.assemble(&blocks.overview).await.map_err(|err| {
                error!(db_error = ?err, "analytics: failed to assemble extended analytics");
                AnalyticsError::UpstreamQueryFailure(err)
            })?;
            Some(block)
        } else {
            None
        };

        Ok(AnalyticsSnapshot {
            time_range: token.as_token(),
            period: AnalyticsPeriod {
                start: window.start,
                end: window.end,
            },
            overview: blocks.overview,
            recent: blocks.recent,
            status_breakdown: blocks.status_breakdown,
            growth: blocks.growth,
            extended,
            generated_at: now,
        })
    }
}

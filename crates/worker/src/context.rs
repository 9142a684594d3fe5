//! Engine context: everything a cycle needs, built once at startup.

use std::sync::Arc;

use chrono::FixedOffset;
use proxwatch_core::proximity::Thresholds;
use proxwatch_db::DbPool;
use proxwatch_transport::{
    HttpFeedSource, LocationSource, LogOnlyTransport, NotificationTransport, OsmAndRelay,
    PositionRelay, PushDelivery,
};

use crate::config::WorkerConfig;
use crate::error::EngineError;

/// Tunables read by the engine steps.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub thresholds: Thresholds,
    /// How far back the proximity step looks for current positions.
    pub proximity_window: chrono::Duration,
    /// Minimum time between two upstream-failure notifications.
    pub failure_cooldown: chrono::Duration,
    /// Timezone used to render timestamps in notification text.
    pub display_offset: FixedOffset,
}

impl EngineSettings {
    pub fn from_config(config: &WorkerConfig) -> Self {
        Self {
            thresholds: config.thresholds,
            proximity_window: config.proximity_window,
            failure_cooldown: config.failure_cooldown,
            display_offset: config.display_offset,
        }
    }
}

/// Shared handles for one engine instance.
#[derive(Clone)]
pub struct EngineContext {
    pub pool: DbPool,
    pub settings: EngineSettings,
    pub source: Option<Arc<dyn LocationSource>>,
    pub relay: Option<Arc<dyn PositionRelay>>,
    pub notifier: Arc<dyn NotificationTransport>,
}

impl EngineContext {
    /// Context with no upstream or relay and a log-only notifier.
    pub fn new(pool: DbPool, settings: EngineSettings) -> Self {
        Self {
            pool,
            settings,
            source: None,
            relay: None,
            notifier: Arc::new(LogOnlyTransport),
        }
    }

    pub fn with_source(mut self, source: Arc<dyn LocationSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_relay(mut self, relay: Arc<dyn PositionRelay>) -> Self {
        self.relay = Some(relay);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationTransport>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Build the HTTP collaborators described by `config`.
    pub fn from_config(pool: DbPool, config: &WorkerConfig) -> Result<Self, EngineError> {
        let mut ctx = Self::new(pool, EngineSettings::from_config(config));

        if let Some(upstream) = &config.upstream {
            let source =
                HttpFeedSource::new(&upstream.url, upstream.token.clone(), config.http_timeout)
                    .map_err(|e| EngineError::Setup(format!("upstream source: {e}")))?;
            ctx = ctx.with_source(Arc::new(source));
        }

        if let Some(relay) = &config.relay {
            let relay = OsmAndRelay::new(&relay.host, &relay.key, config.http_timeout)
                .map_err(|e| EngineError::Setup(format!("position relay: {e}")))?;
            ctx = ctx.with_relay(Arc::new(relay));
        }

        if let Some(push) = &config.push {
            let push = PushDelivery::new(&push.url, &push.token, &push.user, config.http_timeout)
                .map_err(|e| EngineError::Setup(format!("push transport: {e}")))?;
            ctx = ctx.with_notifier(Arc::new(push));
        }

        Ok(ctx)
    }
}

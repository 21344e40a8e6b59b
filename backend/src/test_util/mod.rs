//! Test doubles for the upstream provider.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::{Error, Result, UpstreamKind};
use crate::orchestrator::Orchestrator;
use crate::provider::{CompletionProvider, CompletionRequest, CompletionResponse, Connector};
use crate::state::AppState;

/// What the fake provider answers to every request.
#[derive(Debug, Clone)]
pub enum FakeReply {
    Response(CompletionResponse),
    Fail(UpstreamKind),
}

impl FakeReply {
    pub fn text(content: &str, total_tokens: Option<u32>) -> Self {
        FakeReply::Response(CompletionResponse::single(content, total_tokens))
    }
}

#[derive(Default)]
struct Counters {
    connects: AtomicUsize,
    calls: AtomicUsize,
    last_request: Mutex<Option<CompletionRequest>>,
}

/// Connector that hands out [`FakeProvider`]s and counts what happens.
pub struct FakeConnector {
    configured: bool,
    reply: FakeReply,
    connect_delay: Duration,
    counters: Arc<Counters>,
}

impl FakeConnector {
    pub fn replying(reply: FakeReply) -> Self {
        Self {
            configured: true,
            reply,
            connect_delay: Duration::ZERO,
            counters: Arc::default(),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::replying(FakeReply::Fail(UpstreamKind::Transport))
        }
    }

    /// Slow down client construction to widen races between first callers.
    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }

    /// Number of provider handles built.
    pub fn connects(&self) -> usize {
        self.counters.connects.load(Ordering::SeqCst)
    }

    /// Number of upstream requests issued.
    pub fn calls(&self) -> usize {
        self.counters.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.counters
            .last_request
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl Connector for FakeConnector {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn connect(&self) -> Result<Arc<dyn CompletionProvider>> {
        if !self.configured {
            return Err(Error::NotConfigured("fake connector has no credential".to_string()));
        }
        if !self.connect_delay.is_zero() {
            tokio::time::sleep(self.connect_delay).await;
        }
        self.counters.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(FakeProvider {
            reply: self.reply.clone(),
            counters: self.counters.clone(),
        }))
    }
}

pub struct FakeProvider {
    reply: FakeReply,
    counters: Arc<Counters>,
}

#[async_trait]
impl CompletionProvider for FakeProvider {
    async fn create_completion(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        self.counters.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.counters.last_request.lock() {
            *last = Some(request.clone());
        }
        match &self.reply {
            FakeReply::Response(response) => Ok(response.clone()),
            FakeReply::Fail(kind) => Err(Error::upstream(*kind, "fake upstream failure")),
        }
    }
}

/// Default configuration with a dummy key.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.provider.api_key = Some("sk-test".to_string());
    config.logging.level = "debug".to_string();
    config
}

/// Application state backed by `connector` instead of the real provider.
pub fn test_state(config: Config, connector: Arc<dyn Connector>) -> Arc<AppState> {
    Arc::new(AppState::with_orchestrator(config, Orchestrator::new(connector)))
}

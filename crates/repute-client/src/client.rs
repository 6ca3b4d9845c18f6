//! Main REPUTE client implementation.

use crate::config::ClientConfig;
use crate::executor::execute;
use crate::pool::{PoolSettings, PoolStats, ResourcePool};
use crate::template;
use repute_core::{parse_response, Reputation, ReputeError, Result, ASSERTION_SENDING_SPAM};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::debug;

/// Client for one REPUTE service.
///
/// Cloning is cheap and every clone shares the same transport pool and
/// template cache, so one client can serve any number of concurrent tasks.
///
/// Neither the HTTP stack nor the XML parser needs process-wide setup, so a
/// client can be created at any point; it only needs a tokio runtime to run
/// its queries on.
#[derive(Clone)]
pub struct ReputeClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    service: String,
    scheme: String,
    application: String,
    discovery_template: String,
    template: OnceCell<String>,
    pool: ResourcePool,
    last_error: Mutex<Option<String>>,
}

impl ReputeClient {
    /// Create a client for `service` using default settings
    pub fn new(service: impl Into<String>) -> Result<Self> {
        ReputeClientBuilder::new(service).build()
    }

    /// Create a builder for custom configuration
    #[must_use]
    pub fn builder(service: impl Into<String>) -> ReputeClientBuilder {
        ReputeClientBuilder::new(service)
    }

    /// Look up the DKIM `sending-spam` reputation of `domain`.
    ///
    /// The first query on a client fetches the service's URI template;
    /// concurrent first queries share that single discovery request. A
    /// failed discovery is retried by the next query.
    ///
    /// Returns `Ok(None)` when the server answered with a well-formed
    /// document that holds no matching reputon. That is "no data", not a
    /// neutral reputation.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::Query`](repute_core::ErrorKind::Query) on network
    ///   failure or a non-200 response (discovery included)
    /// - [`ErrorKind::Parse`](repute_core::ErrorKind::Parse) on a malformed
    ///   document
    /// - [`ErrorKind::Internal`](repute_core::ErrorKind::Internal) on
    ///   template or transport construction failure
    ///
    /// Every error is also recorded for [`last_error`](Self::last_error).
    pub async fn query(&self, domain: &str) -> Result<Option<Reputation>> {
        let result = self.run_query(domain).await;
        if let Err(ref e) = result {
            self.inner.record_error(e);
        }
        result
    }

    async fn run_query(&self, domain: &str) -> Result<Option<Reputation>> {
        let inner = &*self.inner;
        let template = self.resolve_template().await?;

        let url = template::expand(
            template,
            &[
                ("subject", domain),
                ("scheme", inner.scheme.as_str()),
                ("service", inner.service.as_str()),
                ("application", inner.application.as_str()),
                ("assertion", ASSERTION_SENDING_SPAM),
            ],
        )?;

        let mut io = inner.pool.acquire()?;
        execute(&mut io, &url).await?;
        parse_response(io.buf.as_bytes())
    }

    async fn resolve_template(&self) -> Result<&str> {
        self.inner
            .template
            .get_or_try_init(|| self.discover())
            .await
            .map(String::as_str)
    }

    /// Fetch the service's query template from its well-known location.
    async fn discover(&self) -> Result<String> {
        let inner = &*self.inner;
        let url = template::expand(
            &inner.discovery_template,
            &[
                ("scheme", inner.scheme.as_str()),
                ("service", inner.service.as_str()),
                ("application", inner.application.as_str()),
            ],
        )?;
        debug!(service = %inner.service, url = %url, "discovering query template");

        let mut io = inner.pool.acquire()?;
        execute(&mut io, &url).await?;
        let template = template::from_discovery_body(io.buf.as_bytes())?;

        debug!(service = %inner.service, template = %template, "query template cached");
        Ok(template)
    }

    /// Service identifier this client queries
    #[must_use]
    pub fn service(&self) -> &str {
        &self.inner.service
    }

    /// Cached query template, if discovery has completed
    #[must_use]
    pub fn template(&self) -> Option<&str> {
        self.inner.template.get().map(String::as_str)
    }

    /// Text of the most recent error returned by [`query`](Self::query).
    ///
    /// With concurrent queries this is whichever failure was recorded
    /// last, not necessarily the caller's own.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.inner
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current size of the transport pool
    #[must_use]
    pub fn pool_stats(&self) -> PoolStats {
        self.inner.pool.stats()
    }

    /// Shut the client down, releasing every idle pooled transport.
    ///
    /// Resources still checked out by other clones go away when the last
    /// clone is dropped.
    pub fn close(self) {
        let released = self.inner.pool.drain();
        debug!(service = %self.inner.service, released, "REPUTE client closed");
    }
}

impl ClientInner {
    fn record_error(&self, err: &ReputeError) {
        debug!(service = %self.service, error = %err, "REPUTE query failed");
        *self
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(err.to_string());
    }
}

impl std::fmt::Debug for ReputeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReputeClient")
            .field("service", &self.inner.service)
            .field("template", &self.template())
            .field("pool", &self.pool_stats())
            .finish_non_exhaustive()
    }
}

/// Builder for configuring a [`ReputeClient`]
#[derive(Debug, Clone)]
pub struct ReputeClientBuilder {
    service: String,
    config: ClientConfig,
    template: Option<String>,
    timeout: Option<Duration>,
}

impl ReputeClientBuilder {
    /// Create a new builder for the given service identifier
    #[must_use]
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            config: ClientConfig::default(),
            template: None,
            timeout: None,
        }
    }

    /// Replace every setting with `config`
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the `{scheme}` template parameter
    #[must_use]
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.config.scheme = scheme.into();
        self
    }

    /// Set the `{application}` template parameter
    #[must_use]
    pub fn application(mut self, application: impl Into<String>) -> Self {
        self.config.application = application.into();
        self
    }

    /// Set the template used to locate the query template (useful for testing)
    #[must_use]
    pub fn discovery_template(mut self, template: impl Into<String>) -> Self {
        self.config.discovery_template = template.into();
        self
    }

    /// Use a known query template and skip discovery
    #[must_use]
    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Set the User-Agent header
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Set a whole-request timeout, overriding `timeout_secs`
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Keep at most `max` idle transports
    #[must_use]
    pub fn max_idle(mut self, max: usize) -> Self {
        self.config.max_idle = Some(max);
        self
    }

    /// Refuse response bodies larger than `max` bytes
    #[must_use]
    pub fn max_response_bytes(mut self, max: usize) -> Self {
        self.config.max_response_bytes = Some(max);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<ReputeClient> {
        if self.service.is_empty() {
            return Err(ReputeError::Internal(
                "service identifier must not be empty".into(),
            ));
        }
        template::validate(&self.config.discovery_template)?;
        if let Some(ref t) = self.template {
            template::validate(t)?;
        }

        let settings = PoolSettings {
            timeout: self.timeout.or_else(|| self.config.timeout()),
            user_agent: self.config.user_agent,
            max_idle: self.config.max_idle,
            max_response_bytes: self.config.max_response_bytes,
        };

        Ok(ReputeClient {
            inner: Arc::new(ClientInner {
                service: self.service,
                scheme: self.config.scheme,
                application: self.config.application,
                discovery_template: self.config.discovery_template,
                template: OnceCell::new_with(self.template),
                pool: ResourcePool::new(settings),
                last_error: Mutex::new(None),
            }),
        })
    }
}

// src/pipeline/context.rs

//! Per-run shared state.

use std::sync::Arc;

use crate::error::Result;
use crate::models::Config;
use crate::pipeline::Policy;
use crate::services::{CheckScheduler, LinkProbe, LinkVerifier, PaginationCrawler};
use crate::utils::http::create_async_client;

/// Everything a run needs, built once from a validated [`Config`].
///
/// The HTTP client, the worker pool and the policy are shared by every
/// target and page of the run.
pub struct RunContext {
    pub config: Arc<Config>,
    pub http: reqwest::Client,
    pub scheduler: CheckScheduler,
    pub policy: Policy,
    pub crawler: PaginationCrawler,
}

impl RunContext {
    /// Validate `config` and build the run's components.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let http = create_async_client(&config.crawler)?;
        let verifier = Arc::new(LinkVerifier::new(http.clone(), &config));
        Ok(Self::assemble(config, http, verifier.clone(), verifier))
    }

    /// Like [`new`](Self::new), but links are checked by `probe`.
    pub fn with_probe(config: Config, probe: Arc<dyn LinkProbe>) -> Result<Self> {
        config.validate()?;
        let http = create_async_client(&config.crawler)?;
        let verifier = Arc::new(LinkVerifier::new(http.clone(), &config));
        Ok(Self::assemble(config, http, verifier, probe))
    }

    fn assemble(
        config: Config,
        http: reqwest::Client,
        verifier: Arc<LinkVerifier>,
        probe: Arc<dyn LinkProbe>,
    ) -> Self {
        let scheduler = CheckScheduler::new(probe, config.crawler.max_workers);
        let policy = Policy::new(&config.policy);
        let crawler = PaginationCrawler::new(verifier, &config.crawler);
        Self {
            config: Arc::new(config),
            http,
            scheduler,
            policy,
            crawler,
        }
    }
}

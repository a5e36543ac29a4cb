//! Source adapters, one per job provider.
//!
//! Each adapter maps one provider's native payload onto [`Posting`] and
//! implements [`SourceAdapter`]. Adapters are chosen at startup by which
//! credentials are present; the collector treats any adapter error as
//! "this source produced nothing this round".

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::models::{Posting, SearchCriteria};

pub mod careers;
pub mod google_jobs;
pub mod http;
pub mod jsearch;
pub mod linkedin;
pub mod normalize;

pub use careers::CareersAdapter;
pub use google_jobs::GoogleJobsAdapter;
pub use jsearch::JSearchAdapter;
pub use linkedin::LinkedInAdapter;

/// The providers jobscout knows how to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// JSearch on RapidAPI (Indeed, LinkedIn, Glassdoor, ZipRecruiter).
    JSearch,
    /// Google Jobs through SerpAPI.
    GoogleJobs,
    /// LinkedIn job search on RapidAPI.
    LinkedIn,
    /// Direct scraping of company career pages.
    CompanyCareers,
}

impl SourceKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::JSearch => "JSearch",
            Self::GoogleJobs => "Google Jobs",
            Self::LinkedIn => "LinkedIn",
            Self::CompanyCareers => "Company Careers",
        }
    }

    /// Prefix for provider-scoped posting ids.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::JSearch => "jsearch",
            Self::GoogleJobs => "google",
            Self::LinkedIn => "linkedin",
            Self::CompanyCareers => "company",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a source contributed nothing. Never escapes the collector.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("malformed payload: {0}")]
    Payload(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("adapter task failed: {0}")]
    Task(String),
}

impl From<reqwest::Error> for SourceError {
    /// Drops the request URL, which can carry an API key in its query string.
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.without_url())
    }
}

/// A pluggable job provider.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Fetches and normalizes postings for `criteria`, in the provider's order.
    async fn fetch(&self, criteria: &SearchCriteria) -> Result<Vec<Posting>, SourceError>;

    fn kind(&self) -> SourceKind;
}

/// Builds the adapters that have what they need to run, in invocation order.
///
/// The careers adapter needs no credentials and is always present; the API
/// adapters are skipped (and logged) when their key is missing.
pub fn configured_sources(config: &Config, client: &reqwest::Client) -> Vec<Arc<dyn SourceAdapter>> {
    let mut sources: Vec<Arc<dyn SourceAdapter>> = Vec::new();

    match config.rapidapi_key.as_deref() {
        Some(key) => {
            sources.push(Arc::new(JSearchAdapter::new(client.clone(), key)));
        }
        None => info!("RAPIDAPI_KEY not set; {} source unavailable", SourceKind::JSearch),
    }

    match config.serpapi_key.as_deref() {
        Some(key) => sources.push(Arc::new(GoogleJobsAdapter::new(client.clone(), key))),
        None => info!("SERPAPI_KEY not set; {} source unavailable", SourceKind::GoogleJobs),
    }

    match config.rapidapi_key.as_deref() {
        Some(key) => sources.push(Arc::new(LinkedInAdapter::new(client.clone(), key))),
        None => info!("RAPIDAPI_KEY not set; {} source unavailable", SourceKind::LinkedIn),
    }

    sources.push(Arc::new(CareersAdapter::new(
        client.clone(),
        config.career_page_timeout(),
        config.career_company_budget(),
    )));

    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
    }

    fn kinds(sources: &[Arc<dyn SourceAdapter>]) -> Vec<SourceKind> {
        sources.iter().map(|s| s.kind()).collect()
    }

    #[test]
    fn test_no_keys_leaves_only_careers() {
        let sources = configured_sources(&config(&[]), &reqwest::Client::new());
        assert_eq!(kinds(&sources), vec![SourceKind::CompanyCareers]);
    }

    #[test]
    fn test_all_keys_in_invocation_order() {
        let sources = configured_sources(
            &config(&[("RAPIDAPI_KEY", "r"), ("SERPAPI_KEY", "s")]),
            &reqwest::Client::new(),
        );
        assert_eq!(
            kinds(&sources),
            vec![
                SourceKind::JSearch,
                SourceKind::GoogleJobs,
                SourceKind::LinkedIn,
                SourceKind::CompanyCareers,
            ]
        );
    }

    #[test]
    fn test_serpapi_only() {
        let sources =
            configured_sources(&config(&[("SERPAPI_KEY", "s")]), &reqwest::Client::new());
        assert_eq!(
            kinds(&sources),
            vec![SourceKind::GoogleJobs, SourceKind::CompanyCareers]
        );
    }

    #[test]
    fn test_source_kind_display() {
        assert_eq!(SourceKind::JSearch.to_string(), "JSearch");
        assert_eq!(SourceKind::GoogleJobs.to_string(), "Google Jobs");
        assert_eq!(SourceKind::CompanyCareers.id_prefix(), "company");
    }

    #[test]
    fn test_source_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SourceError>();
    }
}

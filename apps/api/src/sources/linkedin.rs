//! LinkedIn job search through the RapidAPI `linkedin-data-api`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use crate::models::{Posting, RawPosting, SearchCriteria};
use crate::sources::normalize::{self, days_ago, salary_from_text};
use crate::sources::{http, SourceAdapter, SourceError, SourceKind};

const LINKEDIN_HOST: &str = "linkedin-data-api.p.rapidapi.com";
const DEFAULT_BASE_URL: &str = "https://linkedin-data-api.p.rapidapi.com";
const RESULT_CAP: usize = 20;

pub struct LinkedInAdapter {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct LinkedInResponse {
    #[serde(default)]
    data: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LinkedInJob {
    id: Option<Value>,
    title: Option<String>,
    /// Either a plain name or an object with a `name` field.
    company: Option<Value>,
    location: Option<String>,
    salary: Option<String>,
    #[serde(rename = "type")]
    job_type: Option<String>,
    description: Option<String>,
    skills: Option<Vec<String>>,
    #[serde(alias = "postAt")]
    posted_at: Option<String>,
    url: Option<String>,
}

impl LinkedInAdapter {
    pub fn new(client: reqwest::Client, api_key: &str) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl SourceAdapter for LinkedInAdapter {
    async fn fetch(&self, criteria: &SearchCriteria) -> Result<Vec<Posting>, SourceError> {
        if self.api_key.is_empty() {
            return Err(SourceError::NotConfigured("RAPIDAPI_KEY"));
        }

        let request = self
            .client
            .post(format!("{}/search-jobs", self.base_url))
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", LINKEDIN_HOST)
            .json(&json!({
                "keywords": criteria.role,
                "locationId": criteria.location.as_deref().unwrap_or_default(),
                "datePosted": "anyTime",
                "sort": "mostRelevant",
            }));

        let response: LinkedInResponse = http::send_json(request).await?;
        debug!(count = response.data.len(), "LinkedIn response received");

        let jobs = normalize::lenient_items(response.data, SourceKind::LinkedIn);
        Ok(map_jobs(jobs, &criteria.role, Utc::now()))
    }

    fn kind(&self) -> SourceKind {
        SourceKind::LinkedIn
    }
}

fn map_jobs(jobs: Vec<LinkedInJob>, role: &str, now: DateTime<Utc>) -> Vec<Posting> {
    let fallback_url = format!(
        "https://www.linkedin.com/jobs/search/?keywords={}",
        normalize::encode_query(role)
    );

    jobs.into_iter()
        .take(RESULT_CAP)
        .filter_map(|job| normalize::finalize(to_raw(job, &fallback_url, now)))
        .collect()
}

fn to_raw(job: LinkedInJob, fallback_url: &str, now: DateTime<Utc>) -> RawPosting {
    let id = match &job.id {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => Uuid::new_v4().to_string(),
    };
    let company = match &job.company {
        Some(Value::String(name)) => Some(name.clone()),
        Some(obj @ Value::Object(_)) => obj.get("name").and_then(Value::as_str).map(str::to_string),
        _ => None,
    };

    RawPosting {
        id: format!("{}-{id}", SourceKind::LinkedIn.id_prefix()),
        title: job.title,
        company,
        location: job.location,
        salary: salary_from_text(job.salary.as_deref()),
        employment_type: job.job_type,
        description: job.description,
        requirements: job.skills.unwrap_or_default(),
        posted_days_ago: days_ago(job.posted_at.as_deref(), now),
        apply_url: job.url,
        fallback_url: fallback_url.to_string(),
        source: SourceKind::LinkedIn.name().to_string(),
    }
}

//! Company career pages, scraped directly for the companies named in a request.
//!
//! For each company a handful of conventional career-page URLs are tried in
//! order; the first one that answers 2xx is parsed for job-looking links and
//! the rest are skipped. Companies are scraped concurrently, each under its own
//! deadline so one unreachable company cannot use up the whole source budget.

use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::models::{Posting, RawPosting, SearchCriteria};
use crate::sources::normalize::{self, clean_text};
use crate::sources::{SourceAdapter, SourceError, SourceKind};

/// Candidate career-page URLs, tried in order. `{slug}` is the lowercased
/// company name with whitespace removed.
const DEFAULT_URL_PATTERNS: &[&str] = &[
    "https://{slug}.com/careers",
    "https://www.{slug}.com/careers",
    "https://careers.{slug}.com",
    "https://jobs.{slug}.com",
];
const LISTING_SELECTOR: &str = r#"a[href*="job"], .job-listing, .position"#;
/// Listing text must be strictly longer than this to count as a job title.
const MIN_TITLE_CHARS: usize = 10;
const PER_COMPANY_CAP: usize = 5;
/// Bytes read from a career page before the rest is ignored.
const MAX_PAGE_BYTES: usize = 2 * 1024 * 1024;

pub struct CareersAdapter {
    client: reqwest::Client,
    attempt_timeout: Duration,
    company_budget: Duration,
    url_patterns: Vec<String>,
}

impl CareersAdapter {
    /// `attempt_timeout` bounds each page request; `company_budget` bounds all
    /// attempts for one company.
    pub fn new(
        client: reqwest::Client,
        attempt_timeout: Duration,
        company_budget: Duration,
    ) -> Self {
        Self {
            client,
            attempt_timeout,
            company_budget,
            url_patterns: DEFAULT_URL_PATTERNS.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Replaces the URL patterns (each must contain `{slug}`).
    #[cfg(test)]
    pub fn with_url_patterns(mut self, patterns: Vec<String>) -> Self {
        self.url_patterns = patterns;
        self
    }

    fn candidate_urls(&self, company: &str) -> Vec<String> {
        let slug: String = company.to_lowercase().split_whitespace().collect();
        if slug.is_empty() {
            return Vec::new();
        }
        self.url_patterns
            .iter()
            .map(|pattern| pattern.replace("{slug}", &slug))
            .collect()
    }

    async fn scrape_company(&self, company: &str, role_keyword: &str) -> Vec<Posting> {
        let attempts = self.try_career_pages(company, role_keyword);
        match tokio::time::timeout(self.company_budget, attempts).await {
            Ok(postings) => postings,
            Err(_) => {
                debug!(company, budget = ?self.company_budget, "Career page budget exhausted");
                Vec::new()
            }
        }
    }

    async fn try_career_pages(&self, company: &str, role_keyword: &str) -> Vec<Posting> {
        for url in self.candidate_urls(company) {
            match self.fetch_page(&url).await {
                Ok(html) => {
                    let postings = extract_listings(&html, &url, company, role_keyword);
                    debug!(company, url = %url, count = postings.len(), "Career page scraped");
                    return postings;
                }
                Err(e) => {
                    debug!(company, url = %url, error = %e, "Career page attempt failed");
                }
            }
        }
        debug!(company, "No career page responded");
        Vec::new()
    }

    async fn fetch_page(&self, url: &str) -> Result<String, SourceError> {
        let mut response = self
            .client
            .get(url)
            .timeout(self.attempt_timeout)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            let room = MAX_PAGE_BYTES - body.len();
            if chunk.len() >= room {
                body.extend_from_slice(&chunk[..room]);
                debug!(url, limit = MAX_PAGE_BYTES, "Career page truncated");
                break;
            }
            body.extend_from_slice(&chunk);
        }
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

#[async_trait]
impl SourceAdapter for CareersAdapter {
    async fn fetch(&self, criteria: &SearchCriteria) -> Result<Vec<Posting>, SourceError> {
        if criteria.companies.is_empty() {
            return Ok(Vec::new());
        }

        let role_keyword = criteria.role.trim().to_lowercase();
        let per_company = criteria
            .companies
            .iter()
            .map(|company| self.scrape_company(company, &role_keyword));

        Ok(join_all(per_company).await.into_iter().flatten().collect())
    }

    fn kind(&self) -> SourceKind {
        SourceKind::CompanyCareers
    }
}

/// Pulls job-looking entries out of a career page.
///
/// Entries whose text is too short or lacks the role keyword are skipped.
fn extract_listings(html: &str, page_url: &str, company: &str, role_keyword: &str) -> Vec<Posting> {
    let (Ok(listing_sel), Ok(link_sel)) = (Selector::parse(LISTING_SELECTOR), Selector::parse("a[href]"))
    else {
        return Vec::new();
    };
    let base = Url::parse(page_url).ok();
    let document = Html::parse_document(html);
    let slug: String = company.to_lowercase().split_whitespace().collect();

    document
        .select(&listing_sel)
        .filter_map(|element| {
            let title = clean_text(&element.text().collect::<Vec<_>>().join(" "))?;
            let long_enough = title.chars().count() > MIN_TITLE_CHARS;
            (long_enough && title.to_lowercase().contains(role_keyword))
                .then(|| (title, listing_href(element, &link_sel)))
        })
        .take(PER_COMPANY_CAP)
        .enumerate()
        .filter_map(|(index, (title, href))| {
            let apply_url = href
                .and_then(|href| base.as_ref().and_then(|b| b.join(&href).ok()))
                .map(|u| u.to_string());
            normalize::finalize(RawPosting {
                id: format!("{}-{slug}-{index}", SourceKind::CompanyCareers.id_prefix()),
                title: Some(title),
                company: Some(company.to_string()),
                description: Some(format!("Direct opportunity at {company}")),
                apply_url,
                fallback_url: page_url.to_string(),
                source: format!("{company} Careers"),
                ..Default::default()
            })
        })
        .collect()
}

/// The element's own `href`, or the first link inside a listing container.
fn listing_href(element: ElementRef<'_>, link_sel: &Selector) -> Option<String> {
    element
        .value()
        .attr("href")
        .or_else(|| {
            element
                .select(link_sel)
                .next()
                .and_then(|link| link.value().attr("href"))
        })
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r#"
        <html><body>
          <nav><a href="/jobs">Jobs</a></nav>
          <ul>
            <li><a href="/jobs/1">Senior Rust Engineer, Payments</a></li>
            <li><a href="https://boards.example.com/job/2">Staff RUST Engineer</a></li>
            <li><a href="/jobs/3">Product Designer, Growth</a></li>
          </ul>
          <div class="job-listing"><h3>Rust Engineer (Remote)</h3><a href="/apply/4">Apply</a></div>
          <div class="position">Rust</div>
        </body></html>
    "#;

    fn adapter(attempt_timeout: Duration) -> CareersAdapter {
        CareersAdapter::new(reqwest::Client::new(), attempt_timeout, Duration::from_secs(10))
    }

    fn criteria(companies: &[&str]) -> SearchCriteria {
        SearchCriteria {
            role: "Rust Engineer".to_string(),
            location: None,
            companies: companies.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn test_candidate_urls_follow_conventions() {
        let adapter = adapter(Duration::from_secs(5));
        assert_eq!(
            adapter.candidate_urls("Acme Corp"),
            vec![
                "https://acmecorp.com/careers",
                "https://www.acmecorp.com/careers",
                "https://careers.acmecorp.com",
                "https://jobs.acmecorp.com",
            ]
        );
        assert!(adapter.candidate_urls("   ").is_empty());
    }

    #[test]
    fn test_extract_listings_filters_by_keyword_and_length() {
        let postings = extract_listings(PAGE, "https://acme.com/careers", "Acme", "rust engineer");

        let titles: Vec<&str> = postings.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Senior Rust Engineer, Payments",
                "Staff RUST Engineer",
                "Rust Engineer (Remote) Apply",
            ]
        );
        assert_eq!(postings[0].apply_url, "https://acme.com/jobs/1");
        assert_eq!(postings[1].apply_url, "https://boards.example.com/job/2");
        assert_eq!(postings[2].apply_url, "https://acme.com/apply/4");
        assert_eq!(postings[0].source, "Acme Careers");
        assert_eq!(postings[0].id, "company-acme-0");
        assert_eq!(postings[0].posted_days_ago, 0);
        assert!(postings[0].location.is_none());
        assert!(postings[0].salary.is_none());
    }

    #[test]
    fn test_extract_listings_caps_per_company() {
        let items: String = (0..9)
            .map(|i| format!(r#"<a href="/jobs/{i}">Rust Engineer number {i}</a>"#))
            .collect();
        let html = format!("<html><body>{items}</body></html>");
        let postings = extract_listings(&html, "https://acme.com/careers", "Acme", "rust engineer");
        assert_eq!(postings.len(), PER_COMPANY_CAP);
    }

    #[tokio::test]
    async fn test_stops_at_first_page_that_responds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/acme/first"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/acme/second"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/acme/third"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .expect(0)
            .mount(&server)
            .await;

        let patterns = ["first", "second", "third"]
            .iter()
            .map(|p| format!("{}/{{slug}}/{p}", server.uri()))
            .collect();
        let adapter = adapter(Duration::from_secs(5))
            .with_url_patterns(patterns);

        let postings = adapter.fetch(&criteria(&["Acme"])).await.unwrap();
        assert_eq!(postings.len(), 3);
        assert!(postings[0].apply_url.starts_with(&server.uri()));
    }

    #[tokio::test]
    async fn test_slow_page_times_out_and_next_pattern_is_tried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/acme/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(PAGE)
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/acme/fast"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;

        let patterns = vec![
            format!("{}/{{slug}}/slow", server.uri()),
            format!("{}/{{slug}}/fast", server.uri()),
        ];
        let adapter = adapter(Duration::from_millis(200))
            .with_url_patterns(patterns);

        let postings = adapter.fetch(&criteria(&["Acme"])).await.unwrap();
        assert_eq!(postings.len(), 3);
    }

    #[tokio::test]
    async fn test_unreachable_company_yields_nothing() {
        let server = MockServer::start().await;
        let adapter = adapter(Duration::from_secs(5))
            .with_url_patterns(vec![format!("{}/{{slug}}/careers", server.uri())]);

        let postings = adapter.fetch(&criteria(&["Nobody"])).await.unwrap();
        assert!(postings.is_empty());
    }

    #[tokio::test]
    async fn test_no_companies_makes_no_requests() {
        let adapter = adapter(Duration::from_secs(5))
            .with_url_patterns(vec!["http://127.0.0.1:9/{slug}".to_string()]);
        let postings = adapter.fetch(&criteria(&[])).await.unwrap();
        assert!(postings.is_empty());
    }

    #[tokio::test]
    async fn test_hanging_company_does_not_starve_the_others() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fast/p0"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<a href="/jobs/1">Rust Engineer, Platform</a>"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex("^/slow/"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let patterns = (0..4)
            .map(|i| format!("{}/{{slug}}/p{i}", server.uri()))
            .collect();
        // Four 500ms attempts would overrun the 1.5s source bound without the company budget.
        let adapter = CareersAdapter::new(
            reqwest::Client::new(),
            Duration::from_millis(500),
            Duration::from_millis(1200),
        )
        .with_url_patterns(patterns);

        let postings = tokio::time::timeout(
            Duration::from_millis(1500),
            adapter.fetch(&criteria(&["Fast", "Slow"])),
        )
        .await
        .expect("company budget keeps the source within its bound")
        .unwrap();
        assert_eq!(postings.len(), 1);
        assert_eq!(postings[0].company, "Fast");
    }

    #[tokio::test]
    async fn test_oversized_page_is_truncated() {
        let server = MockServer::start().await;
        let listing = r#"<a href="/jobs/1">Rust Engineer, Payments</a>"#;
        let padding = "<p>filler</p>".repeat(MAX_PAGE_BYTES / 10);
        Mock::given(method("GET"))
            .and(path("/head/careers"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(format!("{listing}{padding}")),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/tail/careers"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(format!("{padding}{listing}")),
            )
            .mount(&server)
            .await;

        let adapter = adapter(Duration::from_secs(5))
            .with_url_patterns(vec![format!("{}/{{slug}}/careers", server.uri())]);

        let head = adapter.fetch(&criteria(&["Head"])).await.unwrap();
        assert_eq!(head.len(), 1);
        let tail = adapter.fetch(&criteria(&["Tail"])).await.unwrap();
        assert!(tail.is_empty());
    }
}

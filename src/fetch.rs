use std::sync::Arc;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tracing::{info, warn};
use url::Url;

use crate::config::FetchSettings;
use crate::error::{Result, RetrievalCause, RobotsError};
use crate::parser::{self, ParseResult};

const MAX_BACKOFF_MS: u64 = 60_000;

/// Result of fetching and parsing one site's robots.txt.
#[derive(Debug)]
pub struct FetchOutcome {
    pub site: String,
    pub result: Result<ParseResult>,
}

/// HTTP retrieval of robots.txt and sitemap documents.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    settings: FetchSettings,
}

impl Fetcher {
    pub fn new(settings: FetchSettings) -> Result<Self> {
        let settings = settings.clamped();
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(RobotsError::HttpClient)?;
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    /// Fetch `site`'s robots.txt and parse it.
    pub async fn fetch_robots(&self, site: &str) -> Result<ParseResult> {
        let url = robots_url(site)?;
        let body = self.fetch_bytes(url.as_str()).await?;
        parser::parse_bytes(&body)
    }

    /// GET `url`, retrying rate limits, server errors and transport failures
    /// with exponential backoff.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let mut attempt = 0;
        loop {
            match self.get_once(url).await {
                Ok(body) => return Ok(body),
                Err(e) if attempt < self.settings.max_retries && is_retryable(&e) => {
                    let backoff = backoff_delay(self.settings.backoff_ms, attempt);
                    warn!(
                        "{} (attempt {}/{}), backing off {:.1}s",
                        e,
                        attempt + 1,
                        self.settings.max_retries,
                        backoff.as_secs_f64()
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn get_once(&self, url: &str) -> Result<Vec<u8>> {
        let start = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RobotsError::retrieval(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RobotsError::retrieval(
                url,
                RetrievalCause::Status(status.as_u16()),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| RobotsError::retrieval(url, e))?;
        info!(
            "GET {} -> {} ({} bytes, {}ms)",
            url,
            status.as_u16(),
            body.len(),
            start.elapsed().as_millis()
        );
        Ok(body.to_vec())
    }

    /// Fetch many sites concurrently, bounded by the configured concurrency.
    /// Outcomes come back in the order `sites` were given.
    pub async fn fetch_many(&self, sites: Vec<String>) -> Vec<FetchOutcome> {
        let total = sites.len();
        let semaphore = Arc::new(Semaphore::new(self.settings.concurrency));

        let pb = ProgressBar::new(total as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec})")
        {
            pb.set_style(style.progress_chars("=> "));
        }

        let (tx, mut rx) =
            tokio::sync::mpsc::channel::<(usize, FetchOutcome)>(self.settings.concurrency * 2);

        for (idx, site) in sites.into_iter().enumerate() {
            let fetcher = self.clone();
            let sem = Arc::clone(&semaphore);
            let tx = tx.clone();

            tokio::spawn(async move {
                let Ok(_permit) = sem.acquire_owned().await else {
                    return;
                };
                let result = fetcher.fetch_robots(&site).await;
                let _ = tx.send((idx, FetchOutcome { site, result })).await;
            });
        }

        // rx closes once every task has dropped its sender
        drop(tx);

        let mut outcomes = Vec::with_capacity(total);
        let mut errors = 0usize;
        while let Some((idx, outcome)) = rx.recv().await {
            if let Err(e) = &outcome.result {
                warn!("{}: {}", outcome.site, e);
                errors += 1;
            }
            outcomes.push((idx, outcome));
            pb.inc(1);
        }

        pb.finish_and_clear();
        info!("Fetched {} sites ({} ok, {} errors)", total, total - errors, errors);

        outcomes.sort_by_key(|(idx, _)| *idx);
        outcomes.into_iter().map(|(_, o)| o).collect()
    }
}

/// The robots.txt location for a site, e.g. `https://example.com/robots.txt`.
///
/// Accepts a bare host, any page URL on the site, or the robots.txt URL itself.
pub fn robots_url(site: &str) -> Result<Url> {
    let site = site.trim();
    let url = match Url::parse(site) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("https://{}", site))?,
        Err(e) => return Err(e.into()),
    };

    if url.path() == "/robots.txt" {
        let mut url = url;
        url.set_fragment(None);
        return Ok(url);
    }
    Ok(url.join("/robots.txt")?)
}

/// `base_ms * 2^attempt`, capped at `MAX_BACKOFF_MS`.
fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    Duration::from_millis(base_ms.saturating_mul(factor).min(MAX_BACKOFF_MS))
}

fn is_retryable(err: &RobotsError) -> bool {
    match err {
        RobotsError::RetrievalFailure { cause, .. } => match cause {
            RetrievalCause::Status(code) => *code == 429 || *code >= 500,
            RetrievalCause::Transport(e) => e.is_timeout() || e.is_connect(),
        },
        _ => false,
    }
}

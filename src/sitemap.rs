use quick_xml::events::Event;
use tracing::{info, warn};

use crate::error::{Result, RobotsError};
use crate::fetch::Fetcher;

/// `<loc>` entries of one sitemap document.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SitemapEntries {
    /// Page URLs from a `<urlset>`.
    pub pages: Vec<String>,
    /// Child sitemap URLs from a `<sitemapindex>`.
    pub sitemaps: Vec<String>,
}

/// Pages collected from a set of sitemaps, and the sitemaps that failed.
#[derive(Debug, Default)]
pub struct CollectedPages {
    pub pages: Vec<String>,
    pub failures: Vec<(String, RobotsError)>,
}

/// Fetch one sitemap and return its entries.
pub async fn fetch_sitemap_urls(fetcher: &Fetcher, sitemap_url: &str) -> Result<SitemapEntries> {
    info!("Fetching sitemap: {}", sitemap_url);
    let xml = fetcher.fetch_bytes(sitemap_url).await?;
    let entries = parse_sitemap(&xml)?;
    info!(
        "{}: {} pages, {} child sitemaps",
        sitemap_url,
        entries.pages.len(),
        entries.sitemaps.len()
    );
    Ok(entries)
}

/// Fetch every listed sitemap, following sitemap indexes one level down.
pub async fn collect_pages(fetcher: &Fetcher, sitemap_urls: &[String]) -> CollectedPages {
    let mut collected = CollectedPages::default();

    for url in sitemap_urls {
        let entries = match fetch_sitemap_urls(fetcher, url).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("{}: {}", url, e);
                collected.failures.push((url.clone(), e));
                continue;
            }
        };
        collected.pages.extend(entries.pages);

        for child in &entries.sitemaps {
            match fetch_sitemap_urls(fetcher, child).await {
                Ok(nested) => {
                    if !nested.sitemaps.is_empty() {
                        warn!("{}: nested sitemap index not followed", child);
                    }
                    collected.pages.extend(nested.pages);
                }
                Err(e) => {
                    warn!("{}: {}", child, e);
                    collected.failures.push((child.clone(), e));
                }
            }
        }
    }

    collected
}

/// Parse a `<urlset>` or `<sitemapindex>` document.
pub fn parse_sitemap(xml: &[u8]) -> Result<SitemapEntries> {
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut entries = SitemapEntries::default();
    let mut in_url = false;
    let mut in_sitemap = false;
    let mut loc: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"url" => in_url = true,
                b"sitemap" => in_sitemap = true,
                b"loc" if in_url || in_sitemap => loc = Some(String::new()),
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if let Some(loc) = loc.as_mut() {
                    loc.push_str(&e.unescape()?);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(loc) = loc.as_mut() {
                    loc.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"loc" => {
                    if let Some(loc) = loc.take() {
                        let loc = loc.trim();
                        match (loc.is_empty(), in_sitemap) {
                            (true, _) => {}
                            (false, true) => entries.sitemaps.push(loc.to_string()),
                            (false, false) => entries.pages.push(loc.to_string()),
                        }
                    }
                }
                b"url" => in_url = false,
                b"sitemap" => in_sitemap = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }
    Ok(entries)
}

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use url::Url;

use crate::settings::{ExtractSettings, SiteConfig, SiteQueries};
use crate::transform::RawArticle;

const BASE_BACKOFF_MS: u64 = 1000;
const REQUEST_TIMEOUT_SECS: u64 = 30;

pub struct ExtractStats {
    pub links: usize,
    pub ok: usize,
    pub skipped: usize,
    pub errors: usize,
}

pub struct Extracted {
    pub articles: Vec<RawArticle>,
    pub stats: ExtractStats,
}

// ── Page parsing ──

fn selector(query: &str) -> Result<Selector> {
    Selector::parse(query).map_err(|e| anyhow!("Invalid CSS selector '{}': {}", query, e))
}

/// Unique `href`s of the homepage elements matched by `homepage_article_links`.
pub fn article_links(html: &str, queries: &SiteQueries) -> Result<BTreeSet<String>> {
    let sel = selector(&queries.homepage_article_links)?;
    let doc = Html::parse_document(html);
    Ok(doc
        .select(&sel)
        .filter_map(|el| el.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
        .collect())
}

/// Absolute http(s) URL for a homepage link; root and relative paths resolve against the site.
pub fn build_link(site: &Url, href: &str) -> Option<String> {
    let link = site.join(href).ok()?;
    matches!(link.scheme(), "http" | "https").then(|| link.to_string())
}

/// Title and body come from the first element matching each query.
pub fn parse_article(html: &str, url: &str, queries: &SiteQueries) -> Result<RawArticle> {
    let title_sel = selector(&queries.article_title)?;
    let body_sel = selector(&queries.article_body)?;
    let doc = Html::parse_document(html);
    Ok(RawArticle {
        url: Some(url.to_string()),
        title: first_text(&doc, &title_sel),
        body: first_text(&doc, &body_sel),
    })
}

fn first_text(doc: &Html, sel: &Selector) -> Option<String> {
    doc.select(sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

// ── Fetching ──

pub fn client(settings: &ExtractSettings) -> Result<Client> {
    Client::builder()
        .user_agent(settings.user_agent.as_str())
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .context("Failed to build HTTP client")
}

fn retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

async fn fetch_html(client: &Client, url: &str, max_retries: u32) -> Result<String> {
    let mut attempt = 0;
    loop {
        let response = client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;
        let status = response.status();
        if status.is_success() {
            return response
                .text()
                .await
                .with_context(|| format!("Failed to read body of {}", url));
        }
        if !retryable(status) || attempt >= max_retries {
            bail!("GET {} returned {}", url, status);
        }

        let backoff = Duration::from_millis(BASE_BACKOFF_MS * 2u64.pow(attempt));
        warn!(
            "{} on {} (attempt {}/{}), backing off {:.1}s",
            status,
            url,
            attempt + 1,
            max_retries,
            backoff.as_secs_f64()
        );
        tokio::time::sleep(backoff).await;
        attempt += 1;
    }
}

/// Scrape one configured site: homepage links, then every article concurrently.
/// Failed or body-less articles are logged and left out.
pub async fn extract_site(
    site_uid: &str,
    site: &SiteConfig,
    settings: &ExtractSettings,
    limit: Option<usize>,
) -> Result<Extracted> {
    let client = client(settings)?;
    let base = Url::parse(&site.url).with_context(|| format!("Bad site url {}", site.url))?;

    info!("Fetching homepage for {}: {}", site_uid, site.url);
    let homepage = fetch_html(&client, &site.url, settings.max_retries).await?;
    let links: BTreeSet<String> = article_links(&homepage, &site.queries)?
        .iter()
        .filter_map(|href| build_link(&base, href))
        .collect();
    let urls: Vec<String> = links.into_iter().take(limit.unwrap_or(usize::MAX)).collect();
    info!("{} article links on {}", urls.len(), site_uid);

    let total = urls.len();
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    let queries = Arc::new(site.queries.clone());
    let semaphore = Arc::new(Semaphore::new(settings.concurrency.max(1)));
    let (tx, mut rx) =
        tokio::sync::mpsc::channel::<(usize, String, Result<RawArticle>)>(settings.concurrency.max(1) * 2);

    for (idx, url) in urls.into_iter().enumerate() {
        let client = client.clone();
        let queries = Arc::clone(&queries);
        let sem = Arc::clone(&semaphore);
        let tx = tx.clone();
        let max_retries = settings.max_retries;

        tokio::spawn(async move {
            let Ok(_permit) = sem.acquire().await else {
                return;
            };
            let result = match fetch_html(&client, &url, max_retries).await {
                Ok(html) => parse_article(&html, &url, &queries),
                Err(e) => Err(e),
            };
            let _ = tx.send((idx, url, result)).await;
        });
    }
    drop(tx);

    let mut results = Vec::with_capacity(total);
    let mut stats = ExtractStats {
        links: total,
        ok: 0,
        skipped: 0,
        errors: 0,
    };

    while let Some((idx, url, result)) = rx.recv().await {
        match result {
            Ok(article) if article.body.is_none() => {
                warn!("No body found on {}, skipping", url);
                stats.skipped += 1;
            }
            Ok(article) => {
                debug!("Fetched {}", url);
                stats.ok += 1;
                results.push((idx, article));
            }
            Err(e) => {
                warn!("Failed to extract {}: {:#}", url, e);
                stats.errors += 1;
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    // keep homepage order regardless of completion order
    results.sort_by_key(|(idx, _)| *idx);
    let articles = results.into_iter().map(|(_, a)| a).collect();

    info!(
        "Extracted {} articles from {} ({} skipped, {} errors)",
        stats.ok, site_uid, stats.skipped, stats.errors
    );
    Ok(Extracted { articles, stats })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queries() -> SiteQueries {
        SiteQueries {
            homepage_article_links: ".headline a".into(),
            article_body: ".article-body".into(),
            article_title: "h1.title".into(),
        }
    }

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap()
    }

    #[test]
    fn homepage_links() {
        let links = article_links(&fixture("homepage"), &queries()).unwrap();
        let links: Vec<&str> = links.iter().map(String::as_str).collect();
        assert_eq!(
            links,
            vec![
                "/nacion/sube-el-precio-del-maiz",
                "https://n.test/mundo/eleccion-en-francia",
                "opinion/columna-del-dia",
            ]
        );
    }

    #[test]
    fn links_resolve_against_site() {
        let base = Url::parse("https://n.test").unwrap();
        assert_eq!(
            build_link(&base, "/nacion/x").as_deref(),
            Some("https://n.test/nacion/x")
        );
        assert_eq!(
            build_link(&base, "opinion/y").as_deref(),
            Some("https://n.test/opinion/y")
        );
        assert_eq!(
            build_link(&base, "https://other.test/a/b").as_deref(),
            Some("https://other.test/a/b")
        );
        assert_eq!(build_link(&base, "mailto:desk@n.test"), None);
    }

    #[test]
    fn article_fields() {
        let a = parse_article(&fixture("article"), "https://n.test/nacion/x", &queries()).unwrap();
        assert_eq!(a.url.as_deref(), Some("https://n.test/nacion/x"));
        assert_eq!(a.title.as_deref(), Some("Sube el precio del maíz"));
        let body = a.body.unwrap();
        assert!(body.starts_with("El precio del maíz"));
        assert!(body.contains('\n'));
    }

    #[test]
    fn article_without_title() {
        let a = parse_article(&fixture("article_no_title"), "https://n.test/a/b", &queries()).unwrap();
        assert_eq!(a.title, None);
        assert!(a.body.is_some());
    }

    #[test]
    fn invalid_selector() {
        let mut q = queries();
        q.article_title = "h1[".into();
        assert!(parse_article("<html></html>", "https://n.test", &q).is_err());
    }

    #[test]
    fn retry_on_throttle_and_server_errors() {
        assert!(retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(retryable(StatusCode::BAD_GATEWAY));
        assert!(!retryable(StatusCode::NOT_FOUND));
    }
}

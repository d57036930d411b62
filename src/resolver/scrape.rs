//! Last-resort resolver that reads the MediaFire download page itself.

// lazy_regex! validates patterns at compile time and stores them in statics
#![allow(clippy::non_std_lazy_statics)]

use super::http::{build_client, fetch_text};
use super::{ResolvedFile, ResolverStrategy, StrategyError};
use async_trait::async_trait;
use lazy_regex::lazy_regex;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Direct link on MediaFire's download CDN
static RE_DIRECT_LINK: lazy_regex::Lazy<regex::Regex> =
    lazy_regex!(r#"https?://download\d*\.mediafire\.com/[^"'\s<>]+"#);

/// File name candidates, most specific first
static RE_NAME_FILENAME_DIV: lazy_regex::Lazy<regex::Regex> =
    lazy_regex!(r#"<div class="filename">\s*([^<]+?)\s*</div>"#);
static RE_NAME_BUTTON_LABEL: lazy_regex::Lazy<regex::Regex> =
    lazy_regex!(r#"class="dl-btn-label"[^>]*title="([^"]+)""#);
static RE_NAME_OG_TITLE: lazy_regex::Lazy<regex::Regex> =
    lazy_regex!(r#"<meta\s+property="og:title"\s+content="([^"]+)""#);
static RE_NAME_TITLE: lazy_regex::Lazy<regex::Regex> =
    lazy_regex!(r"(?i)<title>\s*([^<]+?)\s*</title>");

const TITLE_SUFFIX: &str = " - MediaFire";

/// Extract the direct CDN link from page markup.
#[must_use]
pub fn extract_direct_link(html: &str) -> Option<String> {
    RE_DIRECT_LINK
        .find(html)
        .map(|m| html_escape::decode_html_entities(m.as_str()).into_owned())
}

/// Extract the file name, trying each markup pattern in order.
#[must_use]
pub fn extract_file_name(html: &str) -> Option<String> {
    let patterns: [&regex::Regex; 4] = [
        &RE_NAME_FILENAME_DIV,
        &RE_NAME_BUTTON_LABEL,
        &RE_NAME_OG_TITLE,
        &RE_NAME_TITLE,
    ];

    patterns.iter().find_map(|re| {
        let raw = re.captures(html)?.get(1)?.as_str();
        let decoded = html_escape::decode_html_entities(raw);
        let name = decoded.trim().trim_end_matches(TITLE_SUFFIX).trim();
        (!name.is_empty() && !name.eq_ignore_ascii_case("MediaFire")).then(|| name.to_string())
    })
}

/// Resolver that fetches the source page and pattern-matches the markup.
pub struct ScrapeStrategy {
    client: Client,
    timeout: Duration,
}

impl ScrapeStrategy {
    /// Create a scraper with its own browser-identified client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(timeout, user_agent)?,
            timeout,
        })
    }
}

#[async_trait]
impl ResolverStrategy for ScrapeStrategy {
    fn name(&self) -> &'static str {
        "scrape"
    }

    async fn attempt(&self, source_url: &str) -> Result<ResolvedFile, StrategyError> {
        debug!(url = %source_url, "Scraping download page");
        let html = fetch_text(&self.client, "mediafire page", source_url, self.timeout).await?;

        let link = extract_direct_link(&html).ok_or_else(|| {
            StrategyError::NotFound("no download link in page markup".into())
        })?;
        let name = extract_file_name(&html);
        if name.is_none() {
            debug!("No file name in page markup, using placeholder");
        }

        ResolvedFile::from_parts(name.as_deref(), Some(&link))
    }
}

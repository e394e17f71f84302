//! Scrape proxy: find the species photo on a reference page and relay it.
//!
//! The reference site embeds its photo as `<img class="tur" src="...">`,
//! often with a relative `../` source, and does not send CORS headers. The
//! proxy extracts the first such image, absolutizes its URL, and hands the
//! client a link back through `/api/image-proxy` so the browser can load it.

use crate::config::ProxyConfig;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("not a {host} URL: {url}")]
    NotAllowed { url: String, host: String },
    #[error("no image found on the page")]
    ImageNotFound,
    #[error("upstream returned {0}")]
    Status(reqwest::StatusCode),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("bad extraction pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Result of a successful page scrape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedImage {
    /// Link through this service's image proxy.
    pub image_url: String,
    /// The page that was scraped.
    pub original_url: String,
    /// Absolute upstream image URL.
    pub direct_url: String,
}

/// Image bytes relayed from upstream.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

type Pattern = LazyLock<Result<Regex, regex::Error>>;

static IMG_TAG: Pattern = LazyLock::new(|| Regex::new(r"(?is)<img\b[^>]*>"));
static CLASS_ATTR: Pattern = LazyLock::new(|| attribute_pattern("class"));
static SRC_ATTR: Pattern = LazyLock::new(|| attribute_pattern("src"));

fn attribute_pattern(name: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r#"(?i)\s{name}\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#
    ))
}

fn compiled(pattern: &'static Pattern) -> Result<&'static Regex, ProxyError> {
    match &**pattern {
        Ok(regex) => Ok(regex),
        Err(e) => Err(ProxyError::Pattern(e.clone())),
    }
}

fn attribute<'a>(pattern: &Regex, tag: &'a str) -> Option<&'a str> {
    let caps = pattern.captures(tag)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))
        .map(|m| m.as_str())
}

/// `src` of the first `<img>` whose class list contains `class_name`.
pub fn extract_image_src(html: &str, class_name: &str) -> Result<Option<String>, ProxyError> {
    let img_tag = compiled(&IMG_TAG)?;
    let class_attr = compiled(&CLASS_ATTR)?;
    let src_attr = compiled(&SRC_ATTR)?;

    let first = img_tag.find_iter(html).map(|m| m.as_str()).find(|tag| {
        attribute(class_attr, tag)
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class_name))
    });

    Ok(first
        .and_then(|tag| attribute(src_attr, tag))
        .map(|src| src.trim().replace("&amp;", "&"))
        .filter(|src| !src.is_empty()))
}

/// Make an image source absolute against `site_base`.
///
/// Sources starting with `http` are used as-is. Otherwise the first `..` is
/// dropped and the rest appended to the base, so `../resim/a.jpg` becomes
/// `<site_base>/resim/a.jpg`.
pub fn resolve_image_url(src: &str, site_base: &str) -> String {
    if src.starts_with("http") {
        return src.to_string();
    }
    let path = src.replacen("..", "", 1);
    let base = site_base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// Link to `absolute` through this service's `/api/image-proxy`.
pub fn proxy_url(public_url: &str, absolute: &str) -> String {
    format!(
        "{}/api/image-proxy?url={}",
        public_url.trim_end_matches('/'),
        urlencoding::encode(absolute)
    )
}

/// Outbound HTTP for the scrape proxy. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ProxyClient {
    http: reqwest::Client,
    config: ProxyConfig,
}

impl ProxyClient {
    pub fn new(config: &ProxyConfig) -> Result<Self, ProxyError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    pub fn is_allowed(&self, page_url: &str) -> bool {
        page_url.contains(&self.config.allowed_host)
    }

    /// Scrape `page_url` for its species photo.
    pub async fn extract(&self, page_url: &str, public_url: &str) -> Result<ExtractedImage, ProxyError> {
        if !self.is_allowed(page_url) {
            return Err(ProxyError::NotAllowed {
                url: page_url.to_string(),
                host: self.config.allowed_host.clone(),
            });
        }

        tracing::info!(url = %page_url, "scraping reference page");
        let response = self.http.get(page_url).send().await?;
        if !response.status().is_success() {
            return Err(ProxyError::Status(response.status()));
        }
        let html = response.text().await?;

        let src = extract_image_src(&html, "tur")?.ok_or(ProxyError::ImageNotFound)?;
        let direct_url = resolve_image_url(&src, &self.config.site_base);
        tracing::info!(url = %page_url, image = %direct_url, "reference image found");

        Ok(ExtractedImage {
            image_url: proxy_url(public_url, &direct_url),
            original_url: page_url.to_string(),
            direct_url,
        })
    }

    /// Fetch image bytes, keeping the upstream content type (default `image/jpeg`).
    pub async fn fetch_image(&self, url: &str) -> Result<FetchedImage, ProxyError> {
        tracing::debug!(url = %url, "relaying image");
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ProxyError::Status(response.status()));
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();
        let bytes = response.bytes().await?.to_vec();
        Ok(FetchedImage {
            content_type,
            bytes,
        })
    }
}

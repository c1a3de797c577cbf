//! HTTP fetcher: GET a document and reduce its HTML to plain text.
//!
//! Hyperlinks survive the conversion as `text (absolute-url)` so the claim
//! extractor can see which URL each citation points to.

use async_trait::async_trait;
use regex::{Captures, Regex};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::error::{FetchError, FetchResult};
use crate::traits::fetcher::ContentFetcher;

/// Default user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = "CitationScanner/1.0";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetcher that downloads documents over HTTP(S).
///
/// # Example
///
/// ```rust,ignore
/// use citation_scanner::fetchers::{FetcherExt, HttpFetcher};
///
/// let fetcher = HttpFetcher::new()?.rate_limited(5);
/// let text = fetcher.fetch("https://example.com/article").await?;
/// ```
pub struct HttpFetcher {
    client: reqwest::Client,
    user_agent: String,
    rules: TextRules,
}

impl HttpFetcher {
    /// Create a fetcher with the default timeout and user agent.
    pub fn new() -> FetchResult<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a fetcher whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Http(Box::new(e)))?;

        Ok(Self {
            client,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            rules: TextRules::new()?,
        })
    }

    /// Set a custom user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set a custom HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<String> {
        let parsed = Url::parse(url).map_err(|_| FetchError::InvalidUrl {
            url: url.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl {
                url: url.to_string(),
            });
        }

        debug!(url = %url, "HTTP fetch starting");
        let response = self
            .client
            .get(parsed)
            .header("User-Agent", &self.user_agent)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "HTTP request failed");
                FetchError::Http(Box::new(e))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        // Relative links resolve against the post-redirect location
        let final_url = response.url().clone();

        let html = response
            .text()
            .await
            .map_err(|e| FetchError::Http(Box::new(e)))?;

        let text = self.rules.html_to_text(&html, &final_url);
        if text.is_empty() {
            return Err(FetchError::EmptyContent {
                url: url.to_string(),
            });
        }

        debug!(url = %url, bytes = html.len(), text_length = text.len(), "HTTP fetch complete");
        Ok(text)
    }
}

/// Compiled patterns for the HTML-to-text reduction.
struct TextRules {
    hidden: Regex,
    anchor: Regex,
    block_end: Regex,
    tag: Regex,
    spaces: Regex,
    blank_lines: Regex,
}

impl TextRules {
    fn new() -> FetchResult<Self> {
        let compile =
            |pattern: &str| Regex::new(pattern).map_err(|e| FetchError::Http(Box::new(e)));

        Ok(Self {
            hidden: compile(concat!(
                r"(?is)<(script|style|noscript|head|template)\b[^>]*>",
                r".*?</(script|style|noscript|head|template)>",
            ))?,
            anchor: compile(r#"(?is)<a\s[^>]*?href\s*=\s*["']([^"']+)["'][^>]*>(.*?)</a>"#)?,
            block_end: compile(
                r"(?i)<br\s*/?>|</(p|div|li|h[1-6]|tr|blockquote|section|article)>",
            )?,
            tag: compile(r"<[^>]+>")?,
            spaces: compile(r"[ \t\r\f]+")?,
            blank_lines: compile(r"\n\s*\n\s*(\n\s*)+")?,
        })
    }

    fn html_to_text(&self, html: &str, base: &Url) -> String {
        let text = self.hidden.replace_all(html, " ");

        let text = self.anchor.replace_all(&text, |caps: &Captures| {
            let label = caps.get(2).map_or("", |m| m.as_str());
            match caps.get(1).and_then(|href| resolve_href(base, href.as_str())) {
                Some(target) => format!("{label} ({target})"),
                None => label.to_string(),
            }
        });

        let text = self.block_end.replace_all(&text, "\n");
        let text = self.tag.replace_all(&text, " ");
        let text = decode_entities(&text);
        let text = self.spaces.replace_all(&text, " ");

        let lines: Vec<&str> = text.lines().map(str::trim).collect();
        let text = lines.join("\n");
        self.blank_lines
            .replace_all(&text, "\n\n")
            .trim()
            .to_string()
    }
}

/// Resolve a link target to an absolute http(s) URL, skipping fragments
/// and non-web schemes.
fn resolve_href(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.starts_with('#') {
        return None;
    }
    let resolved = base.join(href).ok()?;
    matches!(resolved.scheme(), "http" | "https").then_some(resolved)
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn to_text(html: &str) -> String {
        let base = Url::parse("https://news.example/articles/1").unwrap();
        TextRules::new().unwrap().html_to_text(html, &base)
    }

    #[test]
    fn test_links_are_kept_inline() {
        let text = to_text(
            r#"<p>Sea levels rose <a href="/data/tides">3mm</a> per year
            (<a href="https://ipcc.example/report">IPCC</a>).</p>"#,
        );

        assert!(text.contains("3mm (https://news.example/data/tides)"));
        assert!(text.contains("IPCC (https://ipcc.example/report)"));
    }

    #[test]
    fn test_scripts_and_fragments_are_dropped() {
        let text = to_text(
            r##"<html><head><title>t</title></head><body>
            <script>var x = "<p>hidden</p>";</script>
            <p>Body &amp; soul <a href="#fn1">[1]</a> <a href="mailto:x@y.z">mail</a></p>
            </body></html>"##,
        );

        assert_eq!(text, "Body & soul [1] mail");
    }

    #[test]
    fn test_blocks_become_lines() {
        let text = to_text("<h1>Title</h1><p>First</p><p>Second<br>line</p>");
        assert_eq!(text, "Title\nFirst\nSecond\nline");
    }

    fn local_fetcher() -> HttpFetcher {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        HttpFetcher::new().unwrap().with_client(client)
    }

    /// Serve one canned HTTP response on a local port.
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{addr}/page")
    }

    #[tokio::test]
    async fn test_fetch_returns_text() {
        let url = serve_once("200 OK", r#"<p>Claim <a href="/src">cited</a></p>"#).await;
        let fetcher = local_fetcher();

        let text = fetcher.fetch(&url).await.unwrap();

        assert!(text.starts_with("Claim cited (http://127.0.0.1:"));
        assert!(text.ends_with("/src)"));
    }

    #[tokio::test]
    async fn test_fetch_error_status() {
        let url = serve_once("404 Not Found", "gone").await;
        let fetcher = local_fetcher();

        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404 }));
    }

    #[tokio::test]
    async fn test_fetch_rejects_bad_urls() {
        let fetcher = HttpFetcher::new().unwrap();

        assert!(matches!(
            fetcher.fetch("not a url").await,
            Err(FetchError::InvalidUrl { .. })
        ));
        assert!(matches!(
            fetcher.fetch("ftp://files.example/a").await,
            Err(FetchError::InvalidUrl { .. })
        ));
    }
}

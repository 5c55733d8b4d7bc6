//! Page title resolution for bookmarks saved without a title.
//!
//! [`TitleFetcher`] is the capability the upsert pipeline consumes; the HTTP
//! implementation fetches the page with a browser user agent and pulls the
//! text of its `<title>` element.

use std::time::Duration;

use reqwest::blocking::Client;
use scraper::{Html, Selector};
use tracing::debug;

use crate::types::errors::FetchError;
use crate::types::settings::FetchSettings;

/// Capability to resolve a page title from a URL.
pub trait TitleFetcher {
    fn fetch_page_title(&self, url: &str) -> Result<String, FetchError>;
}

/// Blocking HTTP title fetcher, with an optional proxy fallback.
pub struct HttpTitleFetcher {
    client: Client,
    proxy_client: Option<Client>,
}

impl HttpTitleFetcher {
    /// Builds the HTTP clients from fetch settings.
    ///
    /// # Errors
    /// Returns `FetchError::Network` if the proxy URL is invalid or the TLS
    /// backend cannot be initialised.
    pub fn new(settings: &FetchSettings) -> Result<Self, FetchError> {
        let timeout = Duration::from_secs(settings.timeout_secs.max(1));
        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let proxy_client = match settings.proxy.as_deref().map(str::trim) {
            Some(proxy) if !proxy.is_empty() => {
                let proxy = reqwest::Proxy::all(proxy).map_err(|e| FetchError::Network(e.to_string()))?;
                let client = Client::builder()
                    .user_agent(settings.user_agent.clone())
                    .timeout(timeout)
                    .proxy(proxy)
                    .build()
                    .map_err(|e| FetchError::Network(e.to_string()))?;
                Some(client)
            }
            _ => None,
        };

        Ok(Self { client, proxy_client })
    }

    fn fetch_body(client: &Client, url: &str) -> Result<String, FetchError> {
        let response = client
            .get(url)
            .send()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        response.text().map_err(|e| FetchError::Network(e.to_string()))
    }
}

impl TitleFetcher for HttpTitleFetcher {
    fn fetch_page_title(&self, url: &str) -> Result<String, FetchError> {
        let body = match Self::fetch_body(&self.client, url) {
            Ok(body) => body,
            Err(direct) => match &self.proxy_client {
                Some(proxy_client) => {
                    debug!(url, error = %direct, "direct fetch failed, retrying through proxy");
                    Self::fetch_body(proxy_client, url)?
                }
                None => return Err(direct),
            },
        };

        extract_title(&body).ok_or_else(|| FetchError::NoTitle(url.to_string()))
    }
}

/// Extracts the document title: the `<title>` in `<head>`, else the first
/// `<title>` anywhere. Entities are decoded by the parser and whitespace is
/// collapsed. `None` when missing or blank.
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    ["head > title", "title"].iter().find_map(|css| {
        let selector = Selector::parse(css).ok()?;
        let element = document.select(&selector).next()?;
        let title = element.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ");
        (!title.is_empty()).then_some(title)
    })
}

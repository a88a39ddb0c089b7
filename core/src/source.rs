use crate::config::FetchConfig;
use crate::error::RetrievalError;
use reqwest::{header, Client};
use url::Url;
use std::future::Future;

/// Anything that can hand back the raw dictionary page for a word.
pub trait PageSource: Send + Sync {
    fn fetch_page(&self, word: &str) -> impl Future<Output = Result<String, RetrievalError>> + Send;
}

/// HTTP GET of `<base_url>/<percent-encoded word>`.
#[derive(Clone)]
pub struct WiktionarySource {
    client: Client,
    base: Url,
}

impl WiktionarySource {
    pub fn new(config: &FetchConfig) -> Result<Self, RetrievalError> {
        let base = Url::parse(&config.base_url)
            .map_err(|_| RetrievalError::InvalidBaseUrl(config.base_url.clone()))?;
        if base.cannot_be_a_base() {
            return Err(RetrievalError::InvalidBaseUrl(config.base_url.clone()));
        }
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(config.timeout())
            .build()
            .map_err(|source| RetrievalError::Transport { url: config.base_url.clone(), source })?;
        Ok(Self { client, base })
    }

    pub fn page_url(&self, word: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(word);
        }
        url
    }
}

impl PageSource for WiktionarySource {
    async fn fetch_page(&self, word: &str) -> Result<String, RetrievalError> {
        let url = self.page_url(word);
        let transport = |source| RetrievalError::Transport { url: url.to_string(), source };
        let resp = self
            .client
            .get(url.clone())
            .header(header::ACCEPT, "text/html")
            .send()
            .await
            .map_err(transport)?;
        if !resp.status().is_success() {
            return Err(RetrievalError::Status { url: url.to_string(), status: resp.status().as_u16() });
        }
        resp.text().await.map_err(transport)
    }
}

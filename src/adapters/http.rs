use crate::core::FeedSource;
use crate::utils::error::{CatalogError, Result};
use async_trait::async_trait;
use reqwest::Client;

/// 對發佈的試算表網址做一次 GET，不設逾時也不重試
#[derive(Debug, Clone)]
pub struct HttpFeedSource {
    client: Client,
    url: String,
}

impl HttpFeedSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), url)
    }

    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self) -> Result<String> {
        tracing::debug!("Making feed request to: {}", self.url);
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        tracing::debug!("Feed response status: {}", status);

        if !status.is_success() {
            return Err(CatalogError::FetchError {
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }

    fn location(&self) -> &str {
        &self.url
    }
}

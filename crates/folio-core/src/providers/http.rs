// HTTP source - bridges the endpoint client with the BlogSource trait
use std::time::Duration;

use async_trait::async_trait;
use folio_api::BlogClient;

use crate::{models::BlogEntry, source::BlogSource, Result};

/// Wrapper around BlogClient that implements BlogSource
pub struct HttpSource {
    client: BlogClient,
}

impl HttpSource {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: BlogClient::with_timeout(endpoint, timeout)?,
        })
    }

    pub fn endpoint(&self) -> &str {
        self.client.endpoint()
    }
}

#[async_trait]
impl BlogSource for HttpSource {
    async fn fetch(&self) -> Result<Vec<BlogEntry>> {
        let posts = self.client.fetch_posts().await?;
        Ok(posts.into_iter().map(BlogEntry::from).collect())
    }
}

use crate::{models::BlogEntry, Result};

/// Where blog entries come from
///
/// One call is one attempt; retrying and caching happen around it in
/// `DataAcquirer`. Keeping the seam here lets tests swap the network out.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait BlogSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<BlogEntry>>;
}

//! REST object storage access
//!
//! Objects live at `/storage/v1/object/<bucket>/<key>`. Public buckets are
//! readable at `/storage/v1/object/public/<bucket>/<key>`, so a public URL
//! is computed locally without a round trip.

use super::client::HostedClient;
use crate::error::Result;
use crate::storage::BlobStore;
use async_trait::async_trait;
use serde::Serialize;

#[derive(Serialize)]
struct RemoveRequest<'a> {
    prefixes: &'a [String],
}

/// `BlobStore` over hosted object storage
#[derive(Clone)]
pub struct RestBlobStore {
    client: HostedClient,
}

impl RestBlobStore {
    pub fn new(client: HostedClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BlobStore for RestBlobStore {
    async fn public_url(&self, bucket: &str, key: &str) -> Result<String> {
        let url = self
            .client
            .endpoint(&["storage", "v1", "object", "public", bucket, key])?;
        Ok(url.to_string())
    }

    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<()> {
        let url = self.client.endpoint(&["storage", "v1", "object", bucket, key])?;
        let req = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(data.to_vec());

        self.client.send(req).await?;

        tracing::debug!("Uploaded object {}/{} ({} bytes)", bucket, key, data.len());
        Ok(())
    }

    async fn remove(&self, bucket: &str, keys: &[String]) -> Result<()> {
        let url = self.client.endpoint(&["storage", "v1", "object", bucket])?;
        let req = self
            .client
            .delete(url)
            .json(&RemoveRequest { prefixes: keys });

        self.client.send(req).await?;

        tracing::debug!("Removed objects {:?} from {}", keys, bucket);
        Ok(())
    }
}

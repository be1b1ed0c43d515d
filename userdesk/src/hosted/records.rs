//! REST table access
//!
//! PostgREST conventions: rows live at `/rest/v1/<table>`, filters are
//! query parameters such as `id=eq.7`, and `Prefer: return=representation`
//! makes writes echo the affected rows.

use super::client::HostedClient;
use crate::database::{NewRecord, Record, RecordChanges};
use crate::error::{AppError, Result};
use crate::storage::RecordStore;
use async_trait::async_trait;
use reqwest::Url;

const RETURN_REPRESENTATION: &str = "return=representation";

/// `RecordStore` over a hosted REST table
#[derive(Clone)]
pub struct RestRecordStore {
    client: HostedClient,
    table: String,
}

impl RestRecordStore {
    pub fn new(client: HostedClient, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    fn table_url(&self) -> Result<Url> {
        self.client.endpoint(&["rest", "v1", &self.table])
    }

    fn row_url(&self, id: i64) -> Result<Url> {
        let mut url = self.table_url()?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{}", id));
        Ok(url)
    }
}

#[async_trait]
impl RecordStore for RestRecordStore {
    async fn select(&self) -> Result<Vec<Record>> {
        let mut url = self.table_url()?;
        url.query_pairs_mut().append_pair("select", "*");

        let records: Vec<Record> = self.client.send_json(self.client.get(url)).await?;

        tracing::debug!("Selected {} rows from {}", records.len(), self.table);
        Ok(records)
    }

    async fn insert(&self, record: &NewRecord) -> Result<Record> {
        let req = self
            .client
            .post(self.table_url()?)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&[record]);

        let created: Vec<Record> = self.client.send_json(req).await?;
        let created = created.into_iter().next().ok_or_else(|| AppError::Backend {
            status: 200,
            message: format!("insert into {} returned no rows", self.table),
        })?;

        tracing::debug!("Inserted row {} into {}", created.id, self.table);
        Ok(created)
    }

    async fn update(&self, id: i64, changes: &RecordChanges) -> Result<()> {
        let req = self
            .client
            .patch(self.row_url(id)?)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(changes);

        let updated: Vec<Record> = self.client.send_json(req).await?;
        if updated.is_empty() {
            return Err(AppError::RecordNotFound(id));
        }

        tracing::debug!("Updated row {} in {}", id, self.table);
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let req = self
            .client
            .delete(self.row_url(id)?)
            .header("Prefer", RETURN_REPRESENTATION);

        let deleted: Vec<Record> = self.client.send_json(req).await?;
        if deleted.is_empty() {
            return Err(AppError::RecordNotFound(id));
        }

        tracing::debug!("Deleted row {} from {}", id, self.table);
        Ok(())
    }
}

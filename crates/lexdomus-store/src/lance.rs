//! LanceDB-backed vector index over the `chunk_vectors` table.
//!
//! Rows carry a `doc_id` and an L2-normalised `embedding`; LanceDB returns the
//! squared L2 distance, which for unit vectors maps onto cosine similarity as
//! `1 - d / 2`.

use std::path::Path;

use arrow::array::AsArray;
use arrow::datatypes::{DataType, Float32Type};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lexdomus_core::corpus::{CHUNK_VECTORS_TABLE, REQUIRED_COLUMNS};
use tracing::info;

use crate::{StoreError, VectorIndex};

pub struct LanceIndex {
    table: lancedb::Table,
    dim: usize,
    rows: usize,
}

impl LanceIndex {
    /// Open the chunk vector table in the database at `path`.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let uri = path
            .to_str()
            .ok_or_else(|| StoreError::Other("non-UTF8 database path".into()))?;
        let db = lancedb::connect(uri).execute().await?;
        let table = db.open_table(CHUNK_VECTORS_TABLE).execute().await?;

        let schema = table.schema().await?;
        for col in REQUIRED_COLUMNS {
            if schema.field_with_name(col).is_err() {
                return Err(StoreError::MissingColumn(col));
            }
        }
        let dim = match schema.field_with_name("embedding")?.data_type() {
            DataType::FixedSizeList(_, n) => *n as usize,
            other => {
                return Err(StoreError::Other(format!(
                    "embedding column has type {other}, expected FixedSizeList"
                )));
            }
        };
        let rows = table.count_rows(None).await?;

        info!(table = CHUNK_VECTORS_TABLE, rows, dim, "opened LanceDB vector index");
        Ok(Self { table, dim, rows })
    }
}

#[async_trait]
impl VectorIndex for LanceIndex {
    fn dim(&self) -> usize {
        self.dim
    }

    fn len(&self) -> usize {
        self.rows
    }

    async fn search(&self, query: &[f32], limit: usize) -> Result<Vec<(String, f32)>, StoreError> {
        if query.len() != self.dim {
            return Err(StoreError::DimensionMismatch {
                expected: self.dim,
                actual: query.len(),
            });
        }
        let batches: Vec<RecordBatch> = self
            .table
            .vector_search(query)?
            .column("embedding")
            .limit(limit)
            .execute()
            .await?
            .try_collect()
            .await?;

        let mut hits = Vec::new();
        for batch in &batches {
            let ids = batch
                .column_by_name("doc_id")
                .and_then(|c| c.as_string_opt::<i32>())
                .ok_or(StoreError::MissingColumn("doc_id"))?;
            let dist = batch
                .column_by_name("_distance")
                .and_then(|c| c.as_primitive_opt::<Float32Type>())
                .ok_or(StoreError::MissingColumn("_distance"))?;
            for i in 0..batch.num_rows() {
                hits.push((ids.value(i).to_string(), 1.0 - dist.value(i) / 2.0));
            }
        }
        hits.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(hits)
    }
}

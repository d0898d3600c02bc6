//! LanceDB-backed image index.
//!
//! Each row is one image: its generated description, file metadata and the
//! description embedding. Queries use cosine distance so `1 - distance` is a
//! usable similarity. LanceDB is async; [`LanceImageIndex`] owns a Tokio
//! runtime and blocks on it so callers stay synchronous.

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Result as AnyResult};
use arrow_array::{Float32Array, RecordBatch, RecordBatchIterator, StringArray, UInt64Array, FixedSizeListArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType};
use tokio::runtime::Runtime;
use tracing::{debug, info};

use doggo_core::error::{Error, Result};
use doggo_core::traits::VectorIndex;
use doggo_core::types::{ImageRecord, Include, Metadata, QueryResponse};

pub mod schema;
pub mod table;

use schema::{build_images_schema, DESCRIPTION, DISTANCE, FILE_NAME, FILE_PATH, FILE_SIZE, ID};
use table::{open_db, table_exists};

pub const DEFAULT_TABLE: &str = "images";

pub struct LanceImageIndex {
    rt: Runtime,
    db: Connection,
    table_name: String,
    dim: usize,
}

impl LanceImageIndex {
    /// Connects to (and creates, if needed) the LanceDB directory at `db_dir`.
    /// The table itself is created on the first [`Self::add_images`].
    pub fn open(db_dir: &Path, table_name: &str, dim: usize) -> Result<Self> {
        std::fs::create_dir_all(db_dir).map_err(|source| Error::Io { path: db_dir.to_path_buf(), source })?;
        let rt = Runtime::new().map_err(|e| Error::Provider(format!("failed to start runtime: {e}")))?;
        let db = rt.block_on(open_db(&db_dir.to_string_lossy())).map_err(provider_error)?;
        debug!(db = %db_dir.display(), table = table_name, dim, "opened image index");
        Ok(Self { rt, db, table_name: table_name.to_string(), dim })
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn add_images(&self, records: &[ImageRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        if let Some(bad) = records.iter().find(|r| r.vector.len() != self.dim) {
            return Err(Error::Validation(format!(
                "image '{}' has a {}-dim vector, index expects {}",
                bad.id,
                bad.vector.len(),
                self.dim
            )));
        }
        self.rt.block_on(self.insert_batch(records)).map_err(provider_error)?;
        info!(rows = records.len(), table = %self.table_name, "added images");
        Ok(())
    }

    pub fn count(&self) -> Result<usize> {
        self.rt.block_on(self.count_rows()).map_err(provider_error)
    }

    async fn count_rows(&self) -> AnyResult<usize> {
        if !table_exists(&self.db, &self.table_name).await? {
            return Ok(0);
        }
        let table = self.db.open_table(&self.table_name).execute().await?;
        Ok(table.count_rows(None).await?)
    }

    async fn insert_batch(&self, records: &[ImageRecord]) -> AnyResult<()> {
        let record_batch = self.to_record_batch(records)?;
        let schema = record_batch.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), schema));
        if table_exists(&self.db, &self.table_name).await? {
            self.db.open_table(&self.table_name).execute().await?.add(reader).execute().await?;
        } else {
            self.db.create_table(&self.table_name, reader).execute().await?;
        }
        Ok(())
    }

    fn to_record_batch(&self, records: &[ImageRecord]) -> AnyResult<RecordBatch> {
        let dim = i32::try_from(self.dim)?;
        let mut ids = Vec::with_capacity(records.len());
        let mut descriptions = Vec::with_capacity(records.len());
        let mut paths = Vec::with_capacity(records.len());
        let mut names = Vec::with_capacity(records.len());
        let mut sizes = Vec::with_capacity(records.len());
        let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(records.len());
        for r in records {
            ids.push(r.id.clone());
            descriptions.push(r.description.clone());
            paths.push(r.file_path.clone());
            names.push(r.file_name.clone());
            sizes.push(r.file_size);
            vectors.push(Some(r.vector.iter().map(|&x| Some(x)).collect()));
        }
        let record_batch = RecordBatch::try_new(
            build_images_schema(dim),
            vec![
                Arc::new(StringArray::from(ids)),
                Arc::new(StringArray::from(descriptions)),
                Arc::new(StringArray::from(paths)),
                Arc::new(StringArray::from(names)),
                Arc::new(UInt64Array::from(sizes)),
                Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors.into_iter(), dim)),
            ],
        )?;
        Ok(record_batch)
    }

    async fn search(&self, embedding: &[f32], n_results: usize, include: Include) -> AnyResult<QueryResponse> {
        let mut ids = Vec::new();
        let mut documents = Vec::new();
        let mut metadatas = Vec::new();
        let mut distances = Vec::new();

        if table_exists(&self.db, &self.table_name).await? {
            let table = self.db.open_table(&self.table_name).execute().await?;
            let mut stream = table
                .vector_search(embedding.to_vec())?
                .distance_type(DistanceType::Cosine)
                .limit(n_results)
                .execute()
                .await?;
            while let Some(batch) = stream.try_next().await? {
                let id_col = string_column(&batch, ID)?;
                let desc_col = string_column(&batch, DESCRIPTION)?;
                let path_col = string_column(&batch, FILE_PATH)?;
                let name_col = string_column(&batch, FILE_NAME)?;
                let size_col = batch
                    .column_by_name(FILE_SIZE)
                    .and_then(|c| c.as_any().downcast_ref::<UInt64Array>())
                    .ok_or_else(|| anyhow!("{FILE_SIZE} column missing"))?;
                let dist_col = batch
                    .column_by_name(DISTANCE)
                    .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
                    .ok_or_else(|| anyhow!("{DISTANCE} column missing"))?;
                for i in 0..batch.num_rows() {
                    ids.push(id_col.value(i).to_string());
                    if include.documents {
                        documents.push(desc_col.value(i).to_string());
                    }
                    if include.metadatas {
                        let mut meta = Metadata::new();
                        meta.insert(FILE_PATH.into(), path_col.value(i).into());
                        meta.insert(FILE_NAME.into(), name_col.value(i).into());
                        meta.insert(FILE_SIZE.into(), size_col.value(i).into());
                        metadatas.push(meta);
                    }
                    if include.distances {
                        distances.push(dist_col.value(i));
                    }
                }
            }
        } else {
            debug!(table = %self.table_name, "table missing, returning empty result set");
        }

        Ok(QueryResponse {
            ids: vec![ids],
            documents: if include.documents { vec![documents] } else { Vec::new() },
            metadatas: if include.metadatas { vec![metadatas] } else { Vec::new() },
            distances: if include.distances { vec![distances] } else { Vec::new() },
        })
    }
}

impl VectorIndex for LanceImageIndex {
    fn query(&self, embedding: &[f32], n_results: usize, include: Include) -> Result<QueryResponse> {
        if embedding.len() != self.dim {
            return Err(Error::Provider(format!(
                "query embedding has {} dims, index expects {}",
                embedding.len(),
                self.dim
            )));
        }
        debug!(table = %self.table_name, n_results, "vector query");
        self.rt.block_on(self.search(embedding, n_results, include)).map_err(provider_error)
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> AnyResult<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| anyhow!("{name} column missing"))
}

fn provider_error(e: anyhow::Error) -> Error {
    Error::Provider(format!("{e:#}"))
}

use sea_orm::{
    ActiveValue, QueryFilter, QuerySelect, TransactionTrait, prelude::*, sea_query::Expr,
};
use tokio::io::{AsyncRead, AsyncReadExt};
use uuid::Uuid;

use crate::{Blob, BlobReader, EngineError, ResultEngine, blob_chunks, blobs};

use super::{Engine, normalize_optional_text, with_tx};

impl Engine {
    /// Store the content of `reader` as a new blob split in chunks of
    /// `chunk_size` bytes.
    ///
    /// Every chunk but the last holds exactly `chunk_size` bytes; short reads
    /// of the source are coalesced. The blob and its chunks are written in a
    /// single transaction.
    pub async fn write_blob<R>(
        &self,
        mut reader: R,
        name: Option<&str>,
        chunk_size: usize,
    ) -> ResultEngine<Uuid>
    where
        R: AsyncRead + Unpin + Send,
    {
        if chunk_size == 0 {
            return Err(EngineError::InvalidChunkSize(chunk_size));
        }
        let name = normalize_optional_text(name);

        with_tx!(self, |db_tx| {
            let blob = blobs::ActiveModel::with_name(name).insert(&db_tx).await?;

            let mut index: i64 = 0;
            let mut size = 0usize;
            loop {
                let mut body = Vec::with_capacity(chunk_size);
                (&mut reader)
                    .take(chunk_size as u64)
                    .read_to_end(&mut body)
                    .await?;
                if body.is_empty() {
                    break;
                }

                let last = body.len() < chunk_size;
                size += body.len();
                let chunk = blob_chunks::ActiveModel {
                    id: ActiveValue::Set(Uuid::new_v4()),
                    blob_id: ActiveValue::Set(blob.id),
                    index: ActiveValue::Set(index),
                    body: ActiveValue::Set(body),
                };
                blob_chunks::Entity::insert(chunk)
                    .exec_without_returning(&db_tx)
                    .await?;
                tracing::debug!(blob = %blob.id, index, "chunk written");
                index += 1;

                if last {
                    break;
                }
            }

            tracing::info!(blob = %blob.id, chunks = index, size, "blob written");
            Ok(blob.id)
        })
    }

    /// Return blob metadata, including chunk count and total size.
    pub async fn blob(&self, blob_id: Uuid) -> ResultEngine<Blob> {
        with_tx!(self, |db_tx| {
            let model = self.require_blob(&db_tx, blob_id).await?;
            let (chunk_count, size) = blob_chunks::Entity::find()
                .select_only()
                .column_as(Expr::cust("COUNT(*)"), "chunk_count")
                .column_as(Expr::cust("COALESCE(SUM(LENGTH(body)), 0)"), "size")
                .filter(blob_chunks::Column::BlobId.eq(blob_id))
                .into_tuple::<(i64, i64)>()
                .one(&db_tx)
                .await?
                .unwrap_or_default();

            Ok(Blob {
                id: model.id,
                name: model.name,
                chunk_count: chunk_count as u64,
                size: size as u64,
                created_at: model.created_at,
                updated_at: model.updated_at,
            })
        })
    }

    /// Open a sequential reader positioned at the first byte of a blob.
    pub async fn blob_reader(&self, blob_id: Uuid) -> ResultEngine<BlobReader> {
        blobs::Entity::find_by_id(blob_id)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("blob {blob_id}")))?;
        Ok(BlobReader::new(self.database.clone(), blob_id))
    }

    /// Delete a blob and its chunks.
    pub async fn delete_blob(&self, blob_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let result = blobs::Entity::delete_by_id(blob_id).exec(&db_tx).await?;
            if result.rows_affected == 0 {
                return Err(EngineError::NotFound(format!("blob {blob_id}")));
            }
            Ok(())
        })
    }
}

//! Sequential reader over the chunks of a blob.

use bytes::{Bytes, BytesMut};
use sea_orm::{DatabaseConnection, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{ResultEngine, blob_chunks};

/// Forward-only reader reconstructing a blob from its chunks.
///
/// Chunks are fetched lazily, one ordered range query at a time, and
/// accumulated in an internal buffer. A reader cannot be rewound: open a new
/// one with [`Engine::blob_reader`](crate::Engine::blob_reader) to start
/// again from the first chunk.
#[derive(Debug)]
pub struct BlobReader {
    database: DatabaseConnection,
    blob_id: Uuid,
    /// Index of the next chunk to fetch.
    next_index: i64,
    /// No chunk left in the database.
    drained: bool,
    buffer: BytesMut,
}

impl BlobReader {
    pub(crate) fn new(database: DatabaseConnection, blob_id: Uuid) -> Self {
        Self {
            database,
            blob_id,
            next_index: 0,
            drained: false,
            buffer: BytesMut::new(),
        }
    }

    pub fn blob_id(&self) -> Uuid {
        self.blob_id
    }

    /// `true` once every byte of the blob has been returned.
    pub fn is_exhausted(&self) -> bool {
        self.drained && self.buffer.is_empty()
    }

    /// Read up to `size` bytes, or everything left with `None`.
    ///
    /// Fewer than `size` bytes are returned only at the end of the blob; an
    /// empty result means the blob is exhausted.
    pub async fn read(&mut self, size: Option<usize>) -> ResultEngine<Bytes> {
        while size.is_none_or(|size| self.buffer.len() < size) {
            match self.next_chunk().await? {
                Some(chunk) => self.buffer.extend_from_slice(&chunk.body),
                None => break,
            }
        }

        let out = match size {
            Some(size) => {
                let len = size.min(self.buffer.len());
                self.buffer.split_to(len)
            }
            None => self.buffer.split(),
        };
        Ok(out.freeze())
    }

    /// Read everything left.
    pub async fn read_to_end(&mut self) -> ResultEngine<Bytes> {
        self.read(None).await
    }

    async fn next_chunk(&mut self) -> ResultEngine<Option<blob_chunks::Model>> {
        if self.drained {
            return Ok(None);
        }

        let chunk = blob_chunks::Entity::find()
            .filter(blob_chunks::Column::BlobId.eq(self.blob_id))
            .filter(blob_chunks::Column::Index.gte(self.next_index))
            .order_by_asc(blob_chunks::Column::Index)
            .one(&self.database)
            .await?;

        match &chunk {
            Some(chunk) => self.next_index = chunk.index + 1,
            None => self.drained = true,
        }
        Ok(chunk)
    }
}

//! One ordered slice of a blob. Chunks are written once, in increasing
//! `index` order, and only go away together with their blob.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "blob_chunks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub blob_id: Uuid,
    /// Zero-based position inside the blob, unique per blob.
    pub index: i64,
    pub body: Vec<u8>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::blobs::Entity",
        from = "Column::BlobId",
        to = "super::blobs::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Blob,
}

impl Related<super::blobs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Blob.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

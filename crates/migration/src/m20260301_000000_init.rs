//! Initial schema migration.
//!
//! Creates the complete schema:
//!
//! - `governments`: owners of budgets
//! - `classification_systems`: named taxonomies
//! - `classifications`: taxonomy nodes, self-referencing through `parent_id`
//! - `budgets`: one government's plan for a year, bound to one system
//! - `budget_items`: atomic or mapped values per `(budget, classification)`
//! - `mapped_classifications`: classifications summed by a mapped item
//! - `blobs` / `blob_chunks`: chunked binary payloads
//!
//! Every ownership edge cascades on delete.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Governments {
    Table,
    Id,
    Name,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ClassificationSystems {
    Table,
    Id,
    Name,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Classifications {
    Table,
    Id,
    Name,
    Code,
    ClassificationSystemId,
    ParentId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Budgets {
    Table,
    Id,
    Name,
    Year,
    Subtitle,
    ClassificationSystemId,
    GovernmentId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum BudgetItems {
    Table,
    Id,
    BudgetId,
    ClassificationId,
    Kind,
    Amount,
    MappedBudgetId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum MappedClassifications {
    Table,
    BudgetItemId,
    ClassificationId,
}

#[derive(Iden)]
enum Blobs {
    Table,
    Id,
    Name,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum BlobChunks {
    Table,
    Id,
    BlobId,
    Index,
    Body,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Governments
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Governments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Governments::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Governments::Name).string().not_null())
                    .col(timestamp_column(Governments::CreatedAt))
                    .col(timestamp_column(Governments::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Classification systems
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(ClassificationSystems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ClassificationSystems::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ClassificationSystems::Name)
                            .string()
                            .not_null(),
                    )
                    .col(timestamp_column(ClassificationSystems::CreatedAt))
                    .col(timestamp_column(ClassificationSystems::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Classifications
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Classifications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Classifications::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Classifications::Name).string().not_null())
                    .col(ColumnDef::new(Classifications::Code).string_len(64))
                    .col(
                        ColumnDef::new(Classifications::ClassificationSystemId)
                            .blob()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Classifications::ParentId).blob())
                    .col(timestamp_column(Classifications::CreatedAt))
                    .col(timestamp_column(Classifications::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-classifications-classification_system_id")
                            .from(
                                Classifications::Table,
                                Classifications::ClassificationSystemId,
                            )
                            .to(ClassificationSystems::Table, ClassificationSystems::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-classifications-parent_id")
                            .from(Classifications::Table, Classifications::ParentId)
                            .to(Classifications::Table, Classifications::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-classifications-classification_system_id-parent_id")
                    .table(Classifications::Table)
                    .col(Classifications::ClassificationSystemId)
                    .col(Classifications::ParentId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Budgets
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Budgets::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Budgets::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Budgets::Name).string().not_null())
                    .col(ColumnDef::new(Budgets::Year).integer().not_null())
                    .col(
                        ColumnDef::new(Budgets::Subtitle)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Budgets::ClassificationSystemId)
                            .blob()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Budgets::GovernmentId).blob().not_null())
                    .col(timestamp_column(Budgets::CreatedAt))
                    .col(timestamp_column(Budgets::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budgets-classification_system_id")
                            .from(Budgets::Table, Budgets::ClassificationSystemId)
                            .to(ClassificationSystems::Table, ClassificationSystems::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budgets-government_id")
                            .from(Budgets::Table, Budgets::GovernmentId)
                            .to(Governments::Table, Governments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-budgets-government_id")
                    .table(Budgets::Table)
                    .col(Budgets::GovernmentId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Budget items
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(BudgetItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BudgetItems::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BudgetItems::BudgetId).blob().not_null())
                    .col(
                        ColumnDef::new(BudgetItems::ClassificationId)
                            .blob()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BudgetItems::Kind).string().not_null())
                    .col(ColumnDef::new(BudgetItems::Amount).double())
                    .col(ColumnDef::new(BudgetItems::MappedBudgetId).blob())
                    .col(timestamp_column(BudgetItems::CreatedAt))
                    .col(timestamp_column(BudgetItems::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budget_items-budget_id")
                            .from(BudgetItems::Table, BudgetItems::BudgetId)
                            .to(Budgets::Table, Budgets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budget_items-classification_id")
                            .from(BudgetItems::Table, BudgetItems::ClassificationId)
                            .to(Classifications::Table, Classifications::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budget_items-mapped_budget_id")
                            .from(BudgetItems::Table, BudgetItems::MappedBudgetId)
                            .to(Budgets::Table, Budgets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-budget_items-budget_id-classification_id-unique")
                    .table(BudgetItems::Table)
                    .col(BudgetItems::BudgetId)
                    .col(BudgetItems::ClassificationId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Mapped classifications
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(MappedClassifications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MappedClassifications::BudgetItemId)
                            .blob()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MappedClassifications::ClassificationId)
                            .blob()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(MappedClassifications::BudgetItemId)
                            .col(MappedClassifications::ClassificationId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-mapped_classifications-budget_item_id")
                            .from(
                                MappedClassifications::Table,
                                MappedClassifications::BudgetItemId,
                            )
                            .to(BudgetItems::Table, BudgetItems::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-mapped_classifications-classification_id")
                            .from(
                                MappedClassifications::Table,
                                MappedClassifications::ClassificationId,
                            )
                            .to(Classifications::Table, Classifications::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Blobs and chunks
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Blobs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Blobs::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Blobs::Name).string())
                    .col(timestamp_column(Blobs::CreatedAt))
                    .col(timestamp_column(Blobs::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BlobChunks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BlobChunks::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BlobChunks::BlobId).blob().not_null())
                    .col(ColumnDef::new(BlobChunks::Index).big_integer().not_null())
                    .col(ColumnDef::new(BlobChunks::Body).blob().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-blob_chunks-blob_id")
                            .from(BlobChunks::Table, BlobChunks::BlobId)
                            .to(Blobs::Table, Blobs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-blob_chunks-blob_id-index-unique")
                    .table(BlobChunks::Table)
                    .col(BlobChunks::BlobId)
                    .col(BlobChunks::Index)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BlobChunks::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Blobs::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MappedClassifications::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BudgetItems::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Budgets::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Classifications::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ClassificationSystems::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Governments::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}

fn timestamp_column<T: IntoIden>(column: T) -> ColumnDef {
    ColumnDef::new(column)
        .timestamp_with_time_zone()
        .not_null()
        .to_owned()
}

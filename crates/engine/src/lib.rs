//! Budgets broken down by hierarchical classifications, plus a chunked blob
//! store.
//!
//! Every operation lives on [`Engine`], which wraps a `sea-orm` database
//! connection migrated with the `migration` crate:
//!
//! - classification trees: [`Engine::new_classification`],
//!   [`Engine::roots`], [`Engine::leaves`], [`Engine::children`],
//!   [`Engine::classification_level`];
//! - budgets and their items: [`Engine::new_budget`],
//!   [`Engine::new_atomic_item`], [`Engine::new_mapped_item`];
//! - value resolution: [`Engine::value_of`], [`Engine::item_value`];
//! - blobs: [`Engine::write_blob`], [`Engine::blob_reader`].

pub use blob_reader::BlobReader;
pub use blobs::{Blob, DEFAULT_CHUNK_SIZE};
pub use budget_items::{BudgetItem, BudgetItemKind};
pub use budgets::{Budget, NewBudget};
pub use classification_systems::ClassificationSystem;
pub use classifications::Classification;
pub use error::EngineError;
pub use governments::Government;
pub use ops::{Engine, EngineBuilder};

mod blob_chunks;
mod blob_reader;
mod blobs;
mod budget_items;
mod budgets;
mod classification_systems;
mod classifications;
mod error;
mod governments;
mod mapped_classifications;
mod ops;

type ResultEngine<T> = Result<T, EngineError>;

use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    BudgetItem, EngineError, ResultEngine, blobs, budget_items, budgets, classification_systems,
    classifications, governments, mapped_classifications,
};

use super::Engine;

/// Generates a `require_*` method loading a row by id, failing with
/// `NotFound` when it is missing.
macro_rules! impl_require {
    ($require_fn:ident, $module:ident, $label:literal) => {
        pub(super) async fn $require_fn(
            &self,
            db: &DatabaseTransaction,
            id: Uuid,
        ) -> ResultEngine<$module::Model> {
            $module::Entity::find_by_id(id)
                .one(db)
                .await?
                .ok_or_else(|| EngineError::NotFound(format!("{} {id}", $label)))
        }
    };
}

impl Engine {
    impl_require!(require_government, governments, "government");
    impl_require!(
        require_classification_system,
        classification_systems,
        "classification system"
    );
    impl_require!(require_classification, classifications, "classification");
    impl_require!(require_budget, budgets, "budget");
    impl_require!(require_blob, blobs, "blob");

    /// Direct children of `classification`, restricted to its own system.
    pub(super) async fn children_of(
        &self,
        db: &DatabaseTransaction,
        classification: &classifications::Model,
    ) -> ResultEngine<Vec<classifications::Model>> {
        classifications::Entity::find()
            .filter(classifications::Column::ParentId.eq(classification.id))
            .filter(
                classifications::Column::ClassificationSystemId
                    .eq(classification.classification_system_id),
            )
            .order_by_asc(classifications::Column::Name)
            .all(db)
            .await
            .map_err(Into::into)
    }

    /// The item stored for `(budget_id, classification_id)`, if any.
    pub(super) async fn find_budget_item(
        &self,
        db: &DatabaseTransaction,
        budget_id: Uuid,
        classification_id: Uuid,
    ) -> ResultEngine<Option<BudgetItem>> {
        let model = budget_items::Entity::find()
            .filter(budget_items::Column::BudgetId.eq(budget_id))
            .filter(budget_items::Column::ClassificationId.eq(classification_id))
            .one(db)
            .await?;
        match model {
            Some(model) => Ok(Some(self.load_budget_item(db, model).await?)),
            None => Ok(None),
        }
    }

    /// Attach the mapped classifications to a stored row and convert it to
    /// its variant.
    pub(super) async fn load_budget_item(
        &self,
        db: &DatabaseTransaction,
        model: budget_items::Model,
    ) -> ResultEngine<BudgetItem> {
        let mapped_classification_ids = mapped_classifications::Entity::find()
            .filter(mapped_classifications::Column::BudgetItemId.eq(model.id))
            .all(db)
            .await?
            .into_iter()
            .map(|row| row.classification_id)
            .collect();
        BudgetItem::try_from((model, mapped_classification_ids))
    }
}

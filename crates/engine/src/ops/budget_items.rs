use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    BudgetItem, BudgetItemKind, EngineError, ResultEngine, budget_items, budgets,
    mapped_classifications,
};

use super::{Engine, classifications::ensure_same_system, with_tx};

impl Engine {
    /// Store a literal amount for `classification_id` in `budget_id`.
    pub async fn new_atomic_item(
        &self,
        budget_id: Uuid,
        classification_id: Uuid,
        amount: f64,
    ) -> ResultEngine<Uuid> {
        with_tx!(self, |db_tx| {
            self.insert_budget_item(
                &db_tx,
                budget_id,
                classification_id,
                BudgetItemKind::Atomic { amount },
            )
            .await
        })
    }

    /// Store an item whose value is the sum of `mapped_classification_ids`
    /// resolved in `mapped_budget_id`.
    ///
    /// The mapped classifications must belong to the mapped budget's
    /// classification system; duplicates are ignored.
    pub async fn new_mapped_item(
        &self,
        budget_id: Uuid,
        classification_id: Uuid,
        mapped_budget_id: Uuid,
        mapped_classification_ids: &[Uuid],
    ) -> ResultEngine<Uuid> {
        let mut seen = HashSet::new();
        let mapped_classification_ids: Vec<Uuid> = mapped_classification_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();
        with_tx!(self, |db_tx| {
            let mapped_budget = self.require_budget(&db_tx, mapped_budget_id).await?;
            for id in &mapped_classification_ids {
                let classification = self.require_classification(&db_tx, *id).await?;
                ensure_same_system(&classification, mapped_budget.classification_system_id)?;
            }

            let item_id = self
                .insert_budget_item(
                    &db_tx,
                    budget_id,
                    classification_id,
                    BudgetItemKind::Mapped {
                        mapped_budget_id,
                        mapped_classification_ids: mapped_classification_ids.clone(),
                    },
                )
                .await?;

            for id in &mapped_classification_ids {
                mapped_classifications::ActiveModel {
                    budget_item_id: ActiveValue::Set(item_id),
                    classification_id: ActiveValue::Set(*id),
                }
                .insert(&db_tx)
                .await?;
            }
            Ok(item_id)
        })
    }

    /// Replace the amount of an atomic item.
    pub async fn set_item_amount(
        &self,
        budget_id: Uuid,
        classification_id: Uuid,
        amount: f64,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let item = self
                .require_budget_item(&db_tx, budget_id, classification_id)
                .await?;
            if !matches!(item.kind, BudgetItemKind::Atomic { .. }) {
                return Err(EngineError::UnsupportedVariant(format!(
                    "item {} is {}, only atomic items hold an amount",
                    item.id,
                    item.kind.as_str()
                )));
            }
            let active = budget_items::ActiveModel {
                id: ActiveValue::Set(item.id),
                amount: ActiveValue::Set(Some(amount)),
                updated_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            };
            active.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Return the item stored for `(budget_id, classification_id)`.
    ///
    /// Fails with `NotFound` when the budget has no item there, even if the
    /// value could be aggregated from the children (see [`Engine::value_of`]).
    pub async fn budget_item(
        &self,
        budget_id: Uuid,
        classification_id: Uuid,
    ) -> ResultEngine<BudgetItem> {
        with_tx!(self, |db_tx| {
            self.require_budget_item(&db_tx, budget_id, classification_id)
                .await
        })
    }

    /// All items of a budget.
    pub async fn budget_items(&self, budget_id: Uuid) -> ResultEngine<Vec<BudgetItem>> {
        with_tx!(self, |db_tx| {
            self.require_budget(&db_tx, budget_id).await?;
            let models = budget_items::Entity::find()
                .filter(budget_items::Column::BudgetId.eq(budget_id))
                .all(&db_tx)
                .await?;
            let mut items = Vec::with_capacity(models.len());
            for model in models {
                items.push(self.load_budget_item(&db_tx, model).await?);
            }
            Ok(items)
        })
    }

    /// Remove the item stored for `(budget_id, classification_id)`.
    pub async fn delete_budget_item(
        &self,
        budget_id: Uuid,
        classification_id: Uuid,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let result = budget_items::Entity::delete_many()
                .filter(budget_items::Column::BudgetId.eq(budget_id))
                .filter(budget_items::Column::ClassificationId.eq(classification_id))
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::NotFound(format!(
                    "budget item for classification {classification_id} in budget {budget_id}"
                )));
            }
            Ok(())
        })
    }

    async fn require_budget_item(
        &self,
        db: &DatabaseTransaction,
        budget_id: Uuid,
        classification_id: Uuid,
    ) -> ResultEngine<BudgetItem> {
        self.find_budget_item(db, budget_id, classification_id)
            .await?
            .ok_or_else(|| {
                EngineError::NotFound(format!(
                    "budget item for classification {classification_id} in budget {budget_id}"
                ))
            })
    }

    /// Validate the `(budget, classification)` pair and insert the item row.
    async fn insert_budget_item(
        &self,
        db: &DatabaseTransaction,
        budget_id: Uuid,
        classification_id: Uuid,
        kind: BudgetItemKind,
    ) -> ResultEngine<Uuid> {
        let budget: budgets::Model = self.require_budget(db, budget_id).await?;
        let classification = self.require_classification(db, classification_id).await?;
        ensure_same_system(&classification, budget.classification_system_id)?;

        let exists = budget_items::Entity::find()
            .filter(budget_items::Column::BudgetId.eq(budget_id))
            .filter(budget_items::Column::ClassificationId.eq(classification_id))
            .one(db)
            .await?
            .is_some();
        if exists {
            return Err(EngineError::ExistingKey(format!(
                "budget item for classification {classification_id} in budget {budget_id}"
            )));
        }

        let item = BudgetItem::new(budget_id, classification_id, kind);
        let model: budget_items::ActiveModel = (&item).into();
        model.insert(db).await?;
        tracing::debug!(
            item = %item.id,
            budget = %budget_id,
            classification = %classification_id,
            kind = item.kind.as_str(),
            "budget item created"
        );
        Ok(item.id)
    }
}

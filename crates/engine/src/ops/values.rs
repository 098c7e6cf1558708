//! Resolution of the value of a classification within a budget.
//!
//! A budget may hold an item at any node of its classification tree. When a
//! node has no item, its value is the sum of its children's values, so
//! unspecified ancestors aggregate from their specified descendants. A
//! mapped item hands resolution back to the resolver on another budget,
//! which makes the whole thing a recursion over a graph that spans budgets.
//!
//! The resolver keeps the stack of `(budget, classification)` pairs being
//! resolved. Re-entering a pair that is still on the stack means the data
//! contains a cycle and resolution fails with `CycleDetected`.

use std::{future::Future, pin::Pin};

use sea_orm::{DatabaseTransaction, TransactionTrait};
use uuid::Uuid;

use crate::{BudgetItem, BudgetItemKind, EngineError, ResultEngine, budgets, classifications};

use super::{Engine, with_tx};

type ValueFuture<'r> = Pin<Box<dyn Future<Output = ResultEngine<f64>> + Send + 'r>>;

impl Engine {
    /// The value of `classification_id` within `budget_id`.
    ///
    /// Uses the item stored for the pair when there is one, otherwise sums
    /// the values of the children (0 for a leaf without item).
    pub async fn value_of(&self, budget_id: Uuid, classification_id: Uuid) -> ResultEngine<f64> {
        with_tx!(self, |db_tx| {
            let budget = self.require_budget(&db_tx, budget_id).await?;
            let classification = self
                .require_classification(&db_tx, classification_id)
                .await?;
            Resolver::new(self, &db_tx)
                .value_of(&budget, &classification)
                .await
        })
    }

    /// The value of a single item: its amount when atomic, the sum of the
    /// mapped classifications resolved in the mapped budget otherwise.
    pub async fn item_value(&self, item: &BudgetItem) -> ResultEngine<f64> {
        with_tx!(self, |db_tx| {
            Resolver::new(self, &db_tx).item_value(item).await
        })
    }
}

struct Resolver<'a> {
    engine: &'a Engine,
    db: &'a DatabaseTransaction,
    stack: Vec<(Uuid, Uuid)>,
}

impl<'a> Resolver<'a> {
    fn new(engine: &'a Engine, db: &'a DatabaseTransaction) -> Self {
        Self {
            engine,
            db,
            stack: Vec::new(),
        }
    }

    fn value_of<'r>(
        &'r mut self,
        budget: &'r budgets::Model,
        classification: &'r classifications::Model,
    ) -> ValueFuture<'r> {
        Box::pin(async move {
            if budget.classification_system_id != classification.classification_system_id {
                return Err(EngineError::MismatchedClassificationSystem(format!(
                    "classification {} belongs to system {}, budget {} uses {}",
                    classification.id,
                    classification.classification_system_id,
                    budget.id,
                    budget.classification_system_id
                )));
            }

            let key = (budget.id, classification.id);
            if self.stack.contains(&key) {
                return Err(EngineError::CycleDetected(format!(
                    "value of classification {} in budget {} depends on itself",
                    classification.id, budget.id
                )));
            }

            self.stack.push(key);
            let value = self.resolve(budget, classification).await;
            self.stack.pop();

            if let Ok(value) = value {
                tracing::debug!(
                    budget = %budget.id,
                    classification = %classification.id,
                    value,
                    "value resolved"
                );
            }
            value
        })
    }

    async fn resolve(
        &mut self,
        budget: &budgets::Model,
        classification: &classifications::Model,
    ) -> ResultEngine<f64> {
        if let Some(item) = self
            .engine
            .find_budget_item(self.db, budget.id, classification.id)
            .await?
        {
            return self.item_value(&item).await;
        }

        let children = self.engine.children_of(self.db, classification).await?;
        let mut total = 0.0;
        for child in &children {
            total += self.value_of(budget, child).await?;
        }
        Ok(total)
    }

    async fn item_value(&mut self, item: &BudgetItem) -> ResultEngine<f64> {
        match &item.kind {
            BudgetItemKind::Atomic { amount } => Ok(*amount),
            BudgetItemKind::Mapped {
                mapped_budget_id,
                mapped_classification_ids,
            } => {
                let mapped_budget = self
                    .engine
                    .require_budget(self.db, *mapped_budget_id)
                    .await?;
                let mut total = 0.0;
                for id in mapped_classification_ids {
                    let classification = self.engine.require_classification(self.db, *id).await?;
                    total += self.value_of(&mapped_budget, &classification).await?;
                }
                Ok(total)
            }
        }
    }
}

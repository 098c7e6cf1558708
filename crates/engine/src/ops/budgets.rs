use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{Budget, EngineError, NewBudget, ResultEngine, budgets};

use super::{Engine, normalize_required_name, with_tx};

impl Engine {
    /// Add a new budget.
    ///
    /// The classification system is fixed here: every item of the budget
    /// must be attached to a classification of that system.
    pub async fn new_budget(&self, input: NewBudget<'_>) -> ResultEngine<Uuid> {
        let name = normalize_required_name(input.name, "budget")?;
        let budget = Budget::new(&input, name);
        let model: budgets::ActiveModel = (&budget).into();
        with_tx!(self, |db_tx| {
            self.require_government(&db_tx, input.government_id)
                .await?;
            self.require_classification_system(&db_tx, input.classification_system_id)
                .await?;
            model.insert(&db_tx).await?;
            tracing::info!(budget = %budget.id, year = budget.year, "budget created");
            Ok(budget.id)
        })
    }

    /// Return a budget from DB.
    pub async fn budget(&self, budget_id: Uuid) -> ResultEngine<Budget> {
        with_tx!(self, |db_tx| {
            let model = self.require_budget(&db_tx, budget_id).await?;
            Ok(Budget::from(model))
        })
    }

    /// Budgets of a government, oldest year first.
    pub async fn budgets(&self, government_id: Uuid) -> ResultEngine<Vec<Budget>> {
        with_tx!(self, |db_tx| {
            self.require_government(&db_tx, government_id).await?;
            let models = budgets::Entity::find()
                .filter(budgets::Column::GovernmentId.eq(government_id))
                .order_by_asc(budgets::Column::Year)
                .order_by_asc(budgets::Column::Name)
                .all(&db_tx)
                .await?;
            Ok(models.into_iter().map(Budget::from).collect::<Vec<_>>())
        })
    }

    /// Update name and subtitle of a budget. Year and classification system
    /// are immutable.
    pub async fn update_budget(
        &self,
        budget_id: Uuid,
        name: &str,
        subtitle: &str,
    ) -> ResultEngine<()> {
        let name = normalize_required_name(name, "budget")?;
        let subtitle = subtitle.trim().to_string();
        with_tx!(self, |db_tx| {
            self.require_budget(&db_tx, budget_id).await?;
            let active = budgets::ActiveModel {
                id: ActiveValue::Set(budget_id),
                name: ActiveValue::Set(name),
                subtitle: ActiveValue::Set(subtitle),
                updated_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            };
            active.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Delete a budget with its items.
    ///
    /// Items of other budgets mapping onto this one are deleted too.
    pub async fn delete_budget(&self, budget_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let result = budgets::Entity::delete_by_id(budget_id)
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::NotFound(format!("budget {budget_id}")));
            }
            Ok(())
        })
    }
}

use chrono::Utc;
use sea_orm::{ActiveValue, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{EngineError, Government, ResultEngine, governments};

use super::{Engine, normalize_required_name, with_tx};

impl Engine {
    /// Add a new government.
    pub async fn new_government(&self, name: &str) -> ResultEngine<Uuid> {
        let name = normalize_required_name(name, "government")?;
        let government = Government::new(name);
        let model: governments::ActiveModel = (&government).into();
        with_tx!(self, |db_tx| {
            model.insert(&db_tx).await?;
            tracing::info!(government = %government.id, "government created");
            Ok(government.id)
        })
    }

    /// Return a government from DB.
    pub async fn government(&self, government_id: Uuid) -> ResultEngine<Government> {
        with_tx!(self, |db_tx| {
            let model = self.require_government(&db_tx, government_id).await?;
            Ok(Government::from(model))
        })
    }

    /// Renames an existing government.
    pub async fn rename_government(&self, government_id: Uuid, new_name: &str) -> ResultEngine<()> {
        let new_name = normalize_required_name(new_name, "government")?;
        with_tx!(self, |db_tx| {
            self.require_government(&db_tx, government_id).await?;
            let active = governments::ActiveModel {
                id: ActiveValue::Set(government_id),
                name: ActiveValue::Set(new_name),
                updated_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            };
            active.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Delete a government together with its budgets.
    pub async fn delete_government(&self, government_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let result = governments::Entity::delete_by_id(government_id)
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::NotFound(format!("government {government_id}")));
            }
            Ok(())
        })
    }
}

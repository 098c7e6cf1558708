use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Query,
};
use uuid::Uuid;

use crate::{
    Classification, ClassificationSystem, EngineError, ResultEngine, classification_systems,
    classifications,
};

use super::{Engine, normalize_optional_text, normalize_required_name, with_tx};

impl Engine {
    /// Add a new, empty classification system.
    pub async fn new_classification_system(&self, name: &str) -> ResultEngine<Uuid> {
        let name = normalize_required_name(name, "classification system")?;
        let system = ClassificationSystem::new(name);
        let model: classification_systems::ActiveModel = (&system).into();
        with_tx!(self, |db_tx| {
            model.insert(&db_tx).await?;
            tracing::info!(classification_system = %system.id, "classification system created");
            Ok(system.id)
        })
    }

    /// Return a classification system from DB.
    pub async fn classification_system(&self, system_id: Uuid) -> ResultEngine<ClassificationSystem> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_classification_system(&db_tx, system_id)
                .await?;
            Ok(ClassificationSystem::from(model))
        })
    }

    /// Delete a classification system.
    ///
    /// Its classifications and every budget using it are deleted too.
    pub async fn delete_classification_system(&self, system_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let result = classification_systems::Entity::delete_by_id(system_id)
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::NotFound(format!(
                    "classification system {system_id}"
                )));
            }
            Ok(())
        })
    }

    /// Nodes of `system_id` without a parent.
    pub async fn roots(&self, system_id: Uuid) -> ResultEngine<Vec<Classification>> {
        with_tx!(self, |db_tx| {
            self.require_classification_system(&db_tx, system_id)
                .await?;
            let models = classifications::Entity::find()
                .filter(classifications::Column::ClassificationSystemId.eq(system_id))
                .filter(classifications::Column::ParentId.is_null())
                .order_by_asc(classifications::Column::Name)
                .all(&db_tx)
                .await?;
            Ok(models.into_iter().map(Classification::from).collect::<Vec<_>>())
        })
    }

    /// Nodes of `system_id` that no other node of the same system uses as
    /// parent.
    pub async fn leaves(&self, system_id: Uuid) -> ResultEngine<Vec<Classification>> {
        with_tx!(self, |db_tx| {
            self.require_classification_system(&db_tx, system_id)
                .await?;
            let parents = Query::select()
                .column(classifications::Column::ParentId)
                .from(classifications::Entity)
                .and_where(classifications::Column::ClassificationSystemId.eq(system_id))
                .and_where(classifications::Column::ParentId.is_not_null())
                .to_owned();
            let models = classifications::Entity::find()
                .filter(classifications::Column::ClassificationSystemId.eq(system_id))
                .filter(classifications::Column::Id.not_in_subquery(parents))
                .order_by_asc(classifications::Column::Name)
                .all(&db_tx)
                .await?;
            Ok(models.into_iter().map(Classification::from).collect::<Vec<_>>())
        })
    }

    /// Add a classification to `system_id`, optionally below `parent_id`.
    ///
    /// The parent must belong to the same classification system.
    pub async fn new_classification(
        &self,
        system_id: Uuid,
        name: &str,
        code: Option<&str>,
        parent_id: Option<Uuid>,
    ) -> ResultEngine<Uuid> {
        let name = normalize_required_name(name, "classification")?;
        let code = normalize_optional_text(code);
        with_tx!(self, |db_tx| {
            self.require_classification_system(&db_tx, system_id)
                .await?;
            if let Some(parent_id) = parent_id {
                let parent = self.require_classification(&db_tx, parent_id).await?;
                ensure_same_system(&parent, system_id)?;
            }

            let classification = Classification::new(system_id, name, code, parent_id);
            let model: classifications::ActiveModel = (&classification).into();
            model.insert(&db_tx).await?;
            tracing::debug!(
                classification = %classification.id,
                parent = ?parent_id,
                "classification created"
            );
            Ok(classification.id)
        })
    }

    /// Return a classification from DB.
    pub async fn classification(&self, classification_id: Uuid) -> ResultEngine<Classification> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_classification(&db_tx, classification_id)
                .await?;
            Ok(Classification::from(model))
        })
    }

    /// Direct children of a classification.
    pub async fn children(&self, classification_id: Uuid) -> ResultEngine<Vec<Classification>> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_classification(&db_tx, classification_id)
                .await?;
            let children = self.children_of(&db_tx, &model).await?;
            Ok(children.into_iter().map(Classification::from).collect::<Vec<_>>())
        })
    }

    /// Depth of a classification: 0 for a root, the parent's level plus one
    /// otherwise.
    pub async fn classification_level(&self, classification_id: Uuid) -> ResultEngine<u32> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_classification(&db_tx, classification_id)
                .await?;
            let ancestors = self.ancestors_of(&db_tx, &model).await?;
            Ok(ancestors.len() as u32)
        })
    }

    /// Move a classification below `parent_id` (or make it a root).
    ///
    /// Fails with `MismatchedClassificationSystem` when the parent belongs to
    /// another system and with `CycleDetected` when the parent is the node
    /// itself or one of its descendants.
    pub async fn set_classification_parent(
        &self,
        classification_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_classification(&db_tx, classification_id)
                .await?;

            if let Some(parent_id) = parent_id {
                let parent = self.require_classification(&db_tx, parent_id).await?;
                ensure_same_system(&parent, model.classification_system_id)?;

                let mut lineage = self.ancestors_of(&db_tx, &parent).await?;
                lineage.push(parent.id);
                if lineage.contains(&classification_id) {
                    return Err(EngineError::CycleDetected(format!(
                        "classification {parent_id} is a descendant of {classification_id}"
                    )));
                }
            }

            let active = classifications::ActiveModel {
                id: ActiveValue::Set(classification_id),
                parent_id: ActiveValue::Set(parent_id),
                updated_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            };
            active.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Delete a classification together with all its descendants.
    pub async fn delete_classification(&self, classification_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let result = classifications::Entity::delete_by_id(classification_id)
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::NotFound(format!(
                    "classification {classification_id}"
                )));
            }
            Ok(())
        })
    }

    /// Ids of the ancestors of `classification`, nearest first.
    ///
    /// Walks the parent chain with a visited set, so a stored cycle ends in
    /// `CycleDetected` instead of looping.
    pub(super) async fn ancestors_of(
        &self,
        db: &DatabaseTransaction,
        classification: &classifications::Model,
    ) -> ResultEngine<Vec<Uuid>> {
        let mut visited = HashSet::from([classification.id]);
        let mut ancestors = Vec::new();
        let mut next = classification.parent_id;
        while let Some(parent_id) = next {
            if !visited.insert(parent_id) {
                return Err(EngineError::CycleDetected(format!(
                    "classification {} is its own ancestor",
                    parent_id
                )));
            }
            let parent = self.require_classification(db, parent_id).await?;
            ancestors.push(parent.id);
            next = parent.parent_id;
        }
        Ok(ancestors)
    }
}

pub(super) fn ensure_same_system(
    classification: &classifications::Model,
    system_id: Uuid,
) -> ResultEngine<()> {
    if classification.classification_system_id != system_id {
        return Err(EngineError::MismatchedClassificationSystem(format!(
            "classification {} belongs to system {}, expected {system_id}",
            classification.id, classification.classification_system_id
        )));
    }
    Ok(())
}

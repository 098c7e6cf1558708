//! Classification nodes.
//!
//! A classification belongs to exactly one classification system and may
//! have a parent in the same system. Nodes are addressed by id and the parent
//! is stored as an optional key, so the forest is a flat table and every
//! structural query (children, roots, leaves) is a filtered lookup.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One node of a classification tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub id: Uuid,
    pub name: String,
    /// Optional code of the node inside its taxonomy (e.g. `"01.1"`).
    pub code: Option<String>,
    pub classification_system_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Classification {
    pub fn new(
        classification_system_id: Uuid,
        name: String,
        code: Option<String>,
        parent_id: Option<Uuid>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            code,
            classification_system_id,
            parent_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "classifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub code: Option<String>,
    pub classification_system_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::classification_systems::Entity",
        from = "Column::ClassificationSystemId",
        to = "super::classification_systems::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    ClassificationSystem,
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Parent,
    #[sea_orm(has_many = "super::budget_items::Entity")]
    BudgetItems,
}

impl Related<super::classification_systems::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClassificationSystem.def()
    }
}

impl Related<super::budget_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Classification> for ActiveModel {
    fn from(value: &Classification) -> Self {
        Self {
            id: ActiveValue::Set(value.id),
            name: ActiveValue::Set(value.name.clone()),
            code: ActiveValue::Set(value.code.clone()),
            classification_system_id: ActiveValue::Set(value.classification_system_id),
            parent_id: ActiveValue::Set(value.parent_id),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl From<Model> for Classification {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            code: model.code,
            classification_system_id: model.classification_system_id,
            parent_id: model.parent_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

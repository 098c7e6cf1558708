//! A budget is a government's spending plan for one year, scoped to a single
//! classification system.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: Uuid,
    pub name: String,
    pub year: i32,
    pub subtitle: String,
    /// Fixed at creation: every item of the budget is attached to a
    /// classification of this system.
    pub classification_system_id: Uuid,
    pub government_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for [`Engine::new_budget`](crate::Engine::new_budget).
#[derive(Clone, Debug)]
pub struct NewBudget<'a> {
    pub name: &'a str,
    pub year: i32,
    pub subtitle: &'a str,
    pub classification_system_id: Uuid,
    pub government_id: Uuid,
}

impl Budget {
    pub fn new(input: &NewBudget<'_>, name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            year: input.year,
            subtitle: input.subtitle.trim().to_string(),
            classification_system_id: input.classification_system_id,
            government_id: input.government_id,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub year: i32,
    pub subtitle: String,
    pub classification_system_id: Uuid,
    pub government_id: Uuid,
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
        belongs_to = "super::governments::Entity",
        from = "Column::GovernmentId",
        to = "super::governments::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Government,
}

impl Related<super::classification_systems::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClassificationSystem.def()
    }
}

impl Related<super::governments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Government.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Budget> for ActiveModel {
    fn from(value: &Budget) -> Self {
        Self {
            id: ActiveValue::Set(value.id),
            name: ActiveValue::Set(value.name.clone()),
            year: ActiveValue::Set(value.year),
            subtitle: ActiveValue::Set(value.subtitle.clone()),
            classification_system_id: ActiveValue::Set(value.classification_system_id),
            government_id: ActiveValue::Set(value.government_id),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl From<Model> for Budget {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            year: model.year,
            subtitle: model.subtitle,
            classification_system_id: model.classification_system_id,
            government_id: model.government_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

//! Budget items attach a value to one `(budget, classification)` pair.
//!
//! The set of variants is closed: an item is either [`Atomic`] (a literal
//! amount) or [`Mapped`] (the sum of values resolved in another budget).
//! Both live in the `budget_items` table, discriminated by `kind`; the
//! classifications of a mapped item live in `mapped_classifications`.
//!
//!  [`Atomic`]: BudgetItemKind::Atomic
//!  [`Mapped`]: BudgetItemKind::Mapped

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

const ATOMIC: &str = "atomic";
const MAPPED: &str = "mapped";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BudgetItemKind {
    Atomic {
        amount: f64,
    },
    Mapped {
        mapped_budget_id: Uuid,
        mapped_classification_ids: Vec<Uuid>,
    },
}

impl BudgetItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Atomic { .. } => ATOMIC,
            Self::Mapped { .. } => MAPPED,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BudgetItem {
    pub id: Uuid,
    pub budget_id: Uuid,
    pub classification_id: Uuid,
    pub kind: BudgetItemKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BudgetItem {
    pub fn new(budget_id: Uuid, classification_id: Uuid, kind: BudgetItemKind) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            budget_id,
            classification_id,
            kind,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budget_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub budget_id: Uuid,
    pub classification_id: Uuid,
    pub kind: String,
    pub amount: Option<f64>,
    pub mapped_budget_id: Option<Uuid>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::budgets::Entity",
        from = "Column::BudgetId",
        to = "super::budgets::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Budget,
    #[sea_orm(
        belongs_to = "super::budgets::Entity",
        from = "Column::MappedBudgetId",
        to = "super::budgets::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    MappedBudget,
    #[sea_orm(
        belongs_to = "super::classifications::Entity",
        from = "Column::ClassificationId",
        to = "super::classifications::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Classification,
    #[sea_orm(has_many = "super::mapped_classifications::Entity")]
    MappedClassifications,
}

impl Related<super::budgets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budget.def()
    }
}

impl Related<super::classifications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Classification.def()
    }
}

impl Related<super::mapped_classifications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MappedClassifications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&BudgetItem> for ActiveModel {
    fn from(value: &BudgetItem) -> Self {
        let (amount, mapped_budget_id) = match &value.kind {
            BudgetItemKind::Atomic { amount } => (Some(*amount), None),
            BudgetItemKind::Mapped {
                mapped_budget_id, ..
            } => (None, Some(*mapped_budget_id)),
        };
        Self {
            id: ActiveValue::Set(value.id),
            budget_id: ActiveValue::Set(value.budget_id),
            classification_id: ActiveValue::Set(value.classification_id),
            kind: ActiveValue::Set(value.kind.as_str().to_string()),
            amount: ActiveValue::Set(amount),
            mapped_budget_id: ActiveValue::Set(mapped_budget_id),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

/// Builds an item from its row and, for mapped items, the ids stored in
/// `mapped_classifications`.
impl TryFrom<(Model, Vec<Uuid>)> for BudgetItem {
    type Error = EngineError;

    fn try_from((model, mapped_classification_ids): (Model, Vec<Uuid>)) -> ResultEngine<Self> {
        let kind = match model.kind.as_str() {
            ATOMIC => {
                let amount = model.amount.ok_or_else(|| {
                    EngineError::UnsupportedVariant(format!(
                        "atomic item {} has no amount",
                        model.id
                    ))
                })?;
                BudgetItemKind::Atomic { amount }
            }
            MAPPED => {
                let mapped_budget_id = model.mapped_budget_id.ok_or_else(|| {
                    EngineError::UnsupportedVariant(format!(
                        "mapped item {} has no mapped budget",
                        model.id
                    ))
                })?;
                BudgetItemKind::Mapped {
                    mapped_budget_id,
                    mapped_classification_ids,
                }
            }
            other => {
                return Err(EngineError::UnsupportedVariant(format!(
                    "item {} has kind '{other}'",
                    model.id
                )));
            }
        };

        Ok(Self {
            id: model.id,
            budget_id: model.budget_id,
            classification_id: model.classification_id,
            kind,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

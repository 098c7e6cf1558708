//! Join table between a mapped budget item and the classifications it sums.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "mapped_classifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub budget_item_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub classification_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::budget_items::Entity",
        from = "Column::BudgetItemId",
        to = "super::budget_items::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    BudgetItem,
    #[sea_orm(
        belongs_to = "super::classifications::Entity",
        from = "Column::ClassificationId",
        to = "super::classifications::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Classification,
}

impl Related<super::budget_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

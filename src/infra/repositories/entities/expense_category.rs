//! Expense category entity.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use crate::domain::ExpenseCategory;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "expense_categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for ExpenseCategory {
    fn from(model: Model) -> Self {
        ExpenseCategory {
            id: model.id,
            company_id: model.company_id,
            name: model.name,
            description: model.description,
            color: model.color,
            is_active: model.is_active,
            created_at: model.created_at,
        }
    }
}

impl From<&ExpenseCategory> for ActiveModel {
    fn from(category: &ExpenseCategory) -> Self {
        ActiveModel {
            id: Set(category.id),
            company_id: Set(category.company_id),
            name: Set(category.name.clone()),
            description: Set(category.description.clone()),
            color: Set(category.color.clone()),
            is_active: Set(category.is_active),
            created_at: Set(category.created_at),
        }
    }
}

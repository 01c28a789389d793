//! Expense entity.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use crate::domain::{Expense, ExpenseStatus, ExpenseType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub project_id: Uuid,
    pub company_id: Uuid,
    pub category_id: Option<Uuid>,
    pub contractor_id: Option<Uuid>,
    pub created_by: Uuid,
    pub approved_by: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub expense_type: String,
    pub status: String,
    pub planned_cost: i64,
    pub actual_cost: i64,
    pub expense_date: Date,
    pub due_date: Option<Date>,
    pub paid_date: Option<Date>,
    pub quantity: f64,
    pub unit: Option<String>,
    pub unit_cost: i64,
    pub invoice_number: Option<String>,
    pub vendor: Option<String>,
    pub notes: Option<String>,
    pub tax_amount: i64,
    pub is_tax_deductible: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Expense {
    fn from(model: Model) -> Self {
        Expense {
            id: model.id,
            project_id: model.project_id,
            company_id: model.company_id,
            category_id: model.category_id,
            contractor_id: model.contractor_id,
            created_by: model.created_by,
            approved_by: model.approved_by,
            name: model.name,
            description: model.description,
            expense_type: ExpenseType::from_db(&model.expense_type),
            status: ExpenseStatus::from_db(&model.status),
            planned_cost: model.planned_cost,
            actual_cost: model.actual_cost,
            expense_date: model.expense_date,
            due_date: model.due_date,
            paid_date: model.paid_date,
            quantity: model.quantity,
            unit: model.unit,
            unit_cost: model.unit_cost,
            invoice_number: model.invoice_number,
            vendor: model.vendor,
            notes: model.notes,
            tax_amount: model.tax_amount,
            is_tax_deductible: model.is_tax_deductible,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<&Expense> for ActiveModel {
    fn from(expense: &Expense) -> Self {
        ActiveModel {
            id: Set(expense.id),
            project_id: Set(expense.project_id),
            company_id: Set(expense.company_id),
            category_id: Set(expense.category_id),
            contractor_id: Set(expense.contractor_id),
            created_by: Set(expense.created_by),
            approved_by: Set(expense.approved_by),
            name: Set(expense.name.clone()),
            description: Set(expense.description.clone()),
            expense_type: Set(expense.expense_type.to_string()),
            status: Set(expense.status.to_string()),
            planned_cost: Set(expense.planned_cost),
            actual_cost: Set(expense.actual_cost),
            expense_date: Set(expense.expense_date),
            due_date: Set(expense.due_date),
            paid_date: Set(expense.paid_date),
            quantity: Set(expense.quantity),
            unit: Set(expense.unit.clone()),
            unit_cost: Set(expense.unit_cost),
            invoice_number: Set(expense.invoice_number.clone()),
            vendor: Set(expense.vendor.clone()),
            notes: Set(expense.notes.clone()),
            tax_amount: Set(expense.tax_amount),
            is_tax_deductible: Set(expense.is_tax_deductible),
            created_at: Set(expense.created_at),
            updated_at: Set(expense.updated_at),
        }
    }
}

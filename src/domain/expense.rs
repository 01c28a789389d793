//! Expenses and expense categories.

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::config::{DEFAULT_CATEGORY_COLOR, MAX_MONEY_AMOUNT};
use crate::errors::{AppError, AppResult};

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").unwrap());

string_enum!(
    ExpenseType {
        Other => "other",
        Material => "material",
        Labor => "labor",
        Equipment => "equipment",
        Permit => "permit",
        Utility => "utility",
        Transportation => "transportation",
        Insurance => "insurance",
    }
);

string_enum!(
    ExpenseStatus {
        Planned => "planned",
        Approved => "approved",
        Paid => "paid",
        Overdue => "overdue",
        Cancelled => "cancelled",
    }
);

/// Expense domain entity. Amounts are minor currency units.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Expense {
    pub id: Uuid,
    pub project_id: Uuid,
    pub company_id: Uuid,
    pub category_id: Option<Uuid>,
    pub contractor_id: Option<Uuid>,
    pub created_by: Uuid,
    pub approved_by: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub expense_type: ExpenseType,
    pub status: ExpenseStatus,
    pub planned_cost: i64,
    pub actual_cost: i64,
    pub expense_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub paid_date: Option<NaiveDate>,
    pub quantity: f64,
    pub unit: Option<String>,
    pub unit_cost: i64,
    pub invoice_number: Option<String>,
    pub vendor: Option<String>,
    pub notes: Option<String>,
    pub tax_amount: i64,
    pub is_tax_deductible: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `unit_cost × quantity` rounded to the nearest minor unit, when both are positive.
pub fn computed_actual_cost(unit_cost: i64, quantity: f64) -> Option<i64> {
    if unit_cost > 0 && quantity > 0.0 {
        Some((unit_cost as f64 * quantity).round() as i64)
    } else {
        None
    }
}

/// Sum of amounts, pinned at the `i64` bounds instead of wrapping.
pub fn sum_amounts<I: IntoIterator<Item = i64>>(amounts: I) -> i64 {
    amounts.into_iter().fold(0, i64::saturating_add)
}

impl Expense {
    pub fn new(
        company_id: Uuid,
        created_by: Uuid,
        input: ExpenseInput,
        today: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        let mut expense = Self {
            id: Uuid::new_v4(),
            project_id: input.project_id,
            company_id,
            category_id: None,
            contractor_id: None,
            created_by,
            approved_by: None,
            name: String::new(),
            description: None,
            expense_type: ExpenseType::Other,
            status: ExpenseStatus::Planned,
            planned_cost: 0,
            actual_cost: 0,
            expense_date: today,
            due_date: None,
            paid_date: None,
            quantity: 1.0,
            unit: None,
            unit_cost: 0,
            invoice_number: None,
            vendor: None,
            notes: None,
            tax_amount: 0,
            is_tax_deductible: false,
            created_at: now,
            updated_at: now,
        };
        expense.apply(input);
        expense
    }

    /// Replace editable fields and re-derive the actual cost. Status moves
    /// only through [`Expense::change_status`], `approve` and `mark_paid`.
    pub fn apply(&mut self, input: ExpenseInput) {
        self.project_id = input.project_id;
        self.category_id = input.category_id;
        self.contractor_id = input.contractor_id;
        self.name = input.name.trim().to_string();
        self.description = input.description;
        if let Some(expense_type) = input.expense_type {
            self.expense_type = expense_type;
        }
        self.planned_cost = input.planned_cost;
        self.actual_cost = input.actual_cost;
        if let Some(date) = input.expense_date {
            self.expense_date = date;
        }
        self.due_date = input.due_date;
        if let Some(quantity) = input.quantity {
            self.quantity = quantity;
        }
        self.unit = input.unit;
        self.unit_cost = input.unit_cost;
        self.invoice_number = input.invoice_number;
        self.vendor = input.vendor;
        self.notes = input.notes;
        self.tax_amount = input.tax_amount;
        self.is_tax_deductible = input.is_tax_deductible;
        self.recompute_actual_cost();
        self.updated_at = Utc::now();
    }

    pub fn recompute_actual_cost(&mut self) {
        if let Some(actual) = computed_actual_cost(self.unit_cost, self.quantity) {
            self.actual_cost = actual;
        }
    }

    /// Actual minus planned cost
    pub fn cost_variance(&self) -> i64 {
        self.actual_cost.saturating_sub(self.planned_cost)
    }

    pub fn is_over_budget(&self) -> bool {
        self.actual_cost > self.planned_cost
    }

    pub fn total_cost_with_tax(&self) -> i64 {
        self.actual_cost.saturating_add(self.tax_amount)
    }

    pub fn approve(&mut self, approver: Uuid) -> AppResult<()> {
        if !matches!(self.status, ExpenseStatus::Planned | ExpenseStatus::Overdue) {
            return Err(AppError::business(format!(
                "Only planned or overdue expenses can be approved (current status: {})",
                self.status
            )));
        }
        self.status = ExpenseStatus::Approved;
        self.approved_by = Some(approver);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Move to `status`, routing approval and payment through their own guards.
    pub fn change_status(
        &mut self,
        status: ExpenseStatus,
        actor: Uuid,
        today: NaiveDate,
    ) -> AppResult<()> {
        if status == self.status {
            return Ok(());
        }
        match status {
            ExpenseStatus::Approved => self.approve(actor),
            ExpenseStatus::Paid => self.mark_paid(today),
            other => {
                if self.status == ExpenseStatus::Paid {
                    return Err(AppError::business("Paid expenses cannot change status"));
                }
                if self.status == ExpenseStatus::Approved {
                    self.approved_by = None;
                }
                self.status = other;
                self.updated_at = Utc::now();
                Ok(())
            }
        }
    }

    pub fn mark_paid(&mut self, paid_date: NaiveDate) -> AppResult<()> {
        if matches!(self.status, ExpenseStatus::Paid | ExpenseStatus::Cancelled) {
            return Err(AppError::business(format!(
                "Expense is already {}",
                self.status
            )));
        }
        self.status = ExpenseStatus::Paid;
        self.paid_date = Some(paid_date);
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Create/update payload for expenses
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ExpenseInput {
    pub project_id: Uuid,
    pub category_id: Option<Uuid>,
    pub contractor_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200, message = "Expense name is required (max 200 characters)"))]
    #[schema(example = "Cement bags")]
    pub name: String,
    pub description: Option<String>,
    pub expense_type: Option<ExpenseType>,
    pub status: Option<ExpenseStatus>,
    #[validate(range(min = 0i64, max = 1_000_000_000_000_000i64, message = "Planned cost is out of range"))]
    #[serde(default)]
    pub planned_cost: i64,
    #[validate(range(min = 0i64, max = 1_000_000_000_000_000i64, message = "Actual cost is out of range"))]
    #[serde(default)]
    pub actual_cost: i64,
    pub expense_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    #[validate(range(min = 0.0, max = 1_000_000.0, message = "Quantity is out of range"))]
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    #[validate(range(min = 0i64, max = 1_000_000_000_000_000i64, message = "Unit cost is out of range"))]
    #[serde(default)]
    pub unit_cost: i64,
    pub invoice_number: Option<String>,
    pub vendor: Option<String>,
    pub notes: Option<String>,
    #[validate(range(min = 0i64, max = 1_000_000_000_000_000i64, message = "Tax amount is out of range"))]
    #[serde(default)]
    pub tax_amount: i64,
    #[serde(default)]
    pub is_tax_deductible: bool,
}

impl ExpenseInput {
    /// The derived `unit_cost × quantity` must stay within the money bound.
    pub fn check_amounts(&self) -> AppResult<()> {
        let quantity = self.quantity.unwrap_or(1.0);
        if !quantity.is_finite() {
            return Err(AppError::validation("Quantity must be a finite number"));
        }
        let derived = self.unit_cost as f64 * quantity;
        if derived > MAX_MONEY_AMOUNT as f64 {
            return Err(AppError::validation(
                "Unit cost times quantity exceeds the largest allowed amount",
            ));
        }
        Ok(())
    }
}

/// Company-defined grouping of expenses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExpenseCategory {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl ExpenseCategory {
    pub fn new(
        company_id: Uuid,
        name: String,
        description: Option<String>,
        color: Option<String>,
    ) -> AppResult<Self> {
        let color = normalize_color(color)?;
        Ok(Self {
            id: Uuid::new_v4(),
            company_id,
            name: name.trim().to_string(),
            description,
            color,
            is_active: true,
            created_at: Utc::now(),
        })
    }
}

/// Validate a `#rrggbb` color, defaulting when absent.
pub fn normalize_color(color: Option<String>) -> AppResult<String> {
    match color {
        None => Ok(DEFAULT_CATEGORY_COLOR.to_string()),
        Some(c) if HEX_COLOR.is_match(c.trim()) => Ok(c.trim().to_lowercase()),
        Some(c) => Err(AppError::validation(format!(
            "Invalid color '{}': expected #rrggbb",
            c
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(unit_cost: i64, quantity: Option<f64>, actual: i64) -> ExpenseInput {
        ExpenseInput {
            project_id: Uuid::new_v4(),
            category_id: None,
            contractor_id: None,
            name: "Cement".to_string(),
            description: None,
            expense_type: Some(ExpenseType::Material),
            status: None,
            planned_cost: 10_000,
            actual_cost: actual,
            expense_date: None,
            due_date: None,
            quantity,
            unit: Some("bag".to_string()),
            unit_cost,
            invoice_number: None,
            vendor: None,
            notes: None,
            tax_amount: 750,
            is_tax_deductible: false,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_actual_cost_follows_unit_cost_times_quantity() {
        let expense = Expense::new(Uuid::new_v4(), Uuid::new_v4(), input(450, Some(25.0), 1), today());
        assert_eq!(expense.actual_cost, 11_250);
        assert!(expense.is_over_budget());
        assert_eq!(expense.cost_variance(), 1_250);
        assert_eq!(expense.total_cost_with_tax(), 12_000);
    }

    #[test]
    fn test_actual_cost_rounds_fractional_quantity() {
        assert_eq!(computed_actual_cost(333, 1.5), Some(500));
        assert_eq!(computed_actual_cost(0, 3.0), None);
        assert_eq!(computed_actual_cost(100, 0.0), None);
    }

    #[test]
    fn test_manual_actual_cost_kept_without_unit_cost() {
        let expense = Expense::new(Uuid::new_v4(), Uuid::new_v4(), input(0, None, 8_000), today());
        assert_eq!(expense.actual_cost, 8_000);
        assert_eq!(expense.quantity, 1.0);
        assert_eq!(expense.expense_date, today());
        assert!(!expense.is_over_budget());
    }

    #[test]
    fn test_approve_and_pay() {
        let approver = Uuid::new_v4();
        let mut expense = Expense::new(Uuid::new_v4(), Uuid::new_v4(), input(0, None, 0), today());

        expense.approve(approver).unwrap();
        assert_eq!(expense.status, ExpenseStatus::Approved);
        assert_eq!(expense.approved_by, Some(approver));
        assert!(expense.approve(approver).is_err());

        expense.mark_paid(today()).unwrap();
        assert_eq!(expense.status, ExpenseStatus::Paid);
        assert_eq!(expense.paid_date, Some(today()));
        assert!(expense.mark_paid(today()).is_err());
    }

    #[test]
    fn test_oversized_derived_cost_is_rejected() {
        let huge = input(i64::MAX / 2, Some(4.0), 0);
        assert!(matches!(huge.check_amounts(), Err(AppError::Validation(_))));
        assert!(input(450, Some(25.0), 0).check_amounts().is_ok());
        assert!(input(450, Some(f64::INFINITY), 0).check_amounts().is_err());
    }

    #[test]
    fn test_derived_figures_saturate() {
        let mut expense = Expense::new(Uuid::new_v4(), Uuid::new_v4(), input(0, None, 0), today());
        expense.actual_cost = i64::MAX;
        expense.tax_amount = 10;
        expense.planned_cost = 0;
        assert_eq!(expense.total_cost_with_tax(), i64::MAX);
        assert_eq!(expense.cost_variance(), i64::MAX);
        assert_eq!(sum_amounts([i64::MAX, 1, 2]), i64::MAX);
    }

    #[test]
    fn test_status_input_does_not_approve() {
        let creator = Uuid::new_v4();
        let mut expense = Expense::new(Uuid::new_v4(), creator, input(0, None, 0), today());
        let mut change = input(0, None, 0);
        change.status = Some(ExpenseStatus::Approved);
        expense.apply(change);
        assert_eq!(expense.status, ExpenseStatus::Planned);

        expense.change_status(ExpenseStatus::Approved, creator, today()).unwrap();
        assert_eq!(expense.approved_by, Some(creator));
        expense.change_status(ExpenseStatus::Planned, creator, today()).unwrap();
        assert_eq!(expense.approved_by, None);

        expense.change_status(ExpenseStatus::Paid, creator, today()).unwrap();
        assert!(expense.change_status(ExpenseStatus::Cancelled, creator, today()).is_err());
    }

    #[test]
    fn test_category_color() {
        assert_eq!(normalize_color(None).unwrap(), "#007bff");
        assert_eq!(normalize_color(Some("#A1B2C3".to_string())).unwrap(), "#a1b2c3");
        assert!(normalize_color(Some("blue".to_string())).is_err());
        assert!(normalize_color(Some("#12345".to_string())).is_err());
    }
}

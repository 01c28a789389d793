//! Company dashboard figures, computed from already-loaded rows.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::expense::{sum_amounts, Expense, ExpenseCategory};
use super::project::{utilization, Project, ProjectStatus};
use crate::config::{DASHBOARD_RECENT_ITEMS, DASHBOARD_TREND_MONTHS};

/// Expense total for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TrendPoint {
    /// e.g. `Mar 2024`
    pub label: String,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatusCount {
    pub status: ProjectStatus,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategoryTotal {
    pub category_id: Uuid,
    pub name: String,
    pub color: String,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DashboardSummary {
    pub total_projects: u64,
    pub active_projects: u64,
    pub completed_projects: u64,
    pub overdue_projects: u64,
    pub total_budget: i64,
    pub total_expenses: i64,
    pub total_planned_expenses: i64,
    pub budget_variance: i64,
    pub budget_utilization: f64,
    pub recent_projects: Vec<Project>,
    pub recent_expenses: Vec<Expense>,
    pub projects_by_status: Vec<StatusCount>,
    pub monthly_trend: Vec<TrendPoint>,
    pub expenses_by_category: Vec<CategoryTotal>,
}

impl DashboardSummary {
    pub fn build(
        projects: &[Project],
        expenses: &[Expense],
        categories: &[ExpenseCategory],
        today: NaiveDate,
    ) -> Self {
        let total_budget = sum_amounts(projects.iter().map(|p| p.total_budget));
        let total_expenses = sum_amounts(expenses.iter().map(|e| e.actual_cost));
        let total_planned_expenses = sum_amounts(expenses.iter().map(|e| e.planned_cost));

        let mut recent_projects = projects.to_vec();
        recent_projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent_projects.truncate(DASHBOARD_RECENT_ITEMS);

        let mut recent_expenses = expenses.to_vec();
        recent_expenses.sort_by(|a, b| {
            b.expense_date
                .cmp(&a.expense_date)
                .then(b.created_at.cmp(&a.created_at))
        });
        recent_expenses.truncate(DASHBOARD_RECENT_ITEMS);

        Self {
            total_projects: projects.len() as u64,
            active_projects: projects.iter().filter(|p| p.status.is_active()).count() as u64,
            completed_projects: projects
                .iter()
                .filter(|p| p.status == ProjectStatus::Completed)
                .count() as u64,
            overdue_projects: projects
                .iter()
                .filter(|p| p.status.is_active() && p.is_overdue(today))
                .count() as u64,
            total_budget,
            total_expenses,
            total_planned_expenses,
            budget_variance: total_budget.saturating_sub(total_expenses),
            budget_utilization: utilization(total_budget, total_expenses),
            recent_projects,
            recent_expenses,
            projects_by_status: projects_by_status(projects),
            monthly_trend: monthly_trend(expenses, today, DASHBOARD_TREND_MONTHS),
            expenses_by_category: by_category(expenses, categories),
        }
    }
}

/// Count per status, every status listed.
pub fn projects_by_status(projects: &[Project]) -> Vec<StatusCount> {
    ProjectStatus::ALL
        .iter()
        .map(|status| StatusCount {
            status: *status,
            count: projects.iter().filter(|p| p.status == *status).count() as u64,
        })
        .collect()
}

/// First day of the month `back` months before `today`'s month.
fn month_start(today: NaiveDate, back: u32) -> Option<NaiveDate> {
    let index = today.year() * 12 + today.month0() as i32 - back as i32;
    NaiveDate::from_ymd_opt(index.div_euclid(12), index.rem_euclid(12) as u32 + 1, 1)
}

/// Actual cost per calendar month for the last `months` months
/// (current month included), oldest first.
pub fn monthly_trend(expenses: &[Expense], today: NaiveDate, months: u32) -> Vec<TrendPoint> {
    (0..months)
        .rev()
        .filter_map(|back| month_start(today, back))
        .map(|start| {
            let total = sum_amounts(
                expenses
                    .iter()
                    .filter(|e| {
                        e.expense_date.year() == start.year()
                            && e.expense_date.month() == start.month()
                    })
                    .map(|e| e.actual_cost),
            );
            TrendPoint {
                label: start.format("%b %Y").to_string(),
                total,
            }
        })
        .collect()
}

/// Actual cost per category, largest first. Uncategorized expenses are left out.
pub fn by_category(expenses: &[Expense], categories: &[ExpenseCategory]) -> Vec<CategoryTotal> {
    let mut totals: HashMap<Uuid, i64> = HashMap::new();
    for expense in expenses {
        if let Some(category_id) = expense.category_id {
            let total = totals.entry(category_id).or_default();
            *total = total.saturating_add(expense.actual_cost);
        }
    }

    let mut result: Vec<CategoryTotal> = categories
        .iter()
        .filter_map(|c| {
            totals.get(&c.id).map(|total| CategoryTotal {
                category_id: c.id,
                name: c.name.clone(),
                color: c.color.clone(),
                total: *total,
            })
        })
        .collect();
    result.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
    result
}

//! Dashboard summary tests: cache use and budget figures.

mod common;

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use construction_tracker::config::DASHBOARD_CACHE_TTL_SECONDS;
use construction_tracker::domain::{DashboardSummary, Expense, ExpenseInput, Project, ProjectInput};
use construction_tracker::errors::AppError;
use construction_tracker::infra::cache::dashboard_key;
use construction_tracker::infra::repositories::{MockExpenseRepository, MockProjectRepository};
use construction_tracker::infra::MockCacheStore;
use construction_tracker::services::{DashboardManager, DashboardService};

use common::{admin_tenant, TestUnitOfWork};

fn project(company_id: Uuid, total_budget: i64) -> Project {
    Project::new(
        company_id,
        Uuid::new_v4(),
        ProjectInput {
            name: "Ikoyi Towers".to_string(),
            description: None,
            location: None,
            status: None,
            priority: None,
            start_date: None,
            end_date: None,
            expected_completion_date: None,
            total_budget,
            client_name: None,
            client_email: None,
            client_phone: None,
            progress_percentage: None,
        },
    )
    .expect("valid project")
}

fn expense(project: &Project, actual_cost: i64) -> Expense {
    Expense::new(
        project.company_id,
        project.created_by,
        ExpenseInput {
            project_id: project.id,
            category_id: None,
            contractor_id: None,
            name: "Steel rods".to_string(),
            description: None,
            expense_type: None,
            status: None,
            planned_cost: actual_cost,
            actual_cost,
            expense_date: None,
            due_date: None,
            quantity: None,
            unit: None,
            unit_cost: 0,
            invoice_number: None,
            vendor: None,
            notes: None,
            tax_amount: 0,
            is_tax_deductible: false,
        },
        Utc::now().date_naive(),
    )
}

#[tokio::test]
async fn test_cached_summary_skips_the_database() {
    let ctx = admin_tenant();
    let cached = DashboardSummary::build(&[], &[], &[], Utc::now().date_naive());
    let json = serde_json::to_string(&cached).expect("serializable");
    let key = dashboard_key(ctx.company.id);

    let mut cache = MockCacheStore::new();
    cache
        .expect_get()
        .withf(move |k| k == key)
        .returning(move |_| Ok(Some(json.clone())));
    cache.expect_set().never();
    let mut projects = MockProjectRepository::new();
    projects.expect_list_all().never();

    let summary = DashboardManager::new(
        Arc::new(TestUnitOfWork::default().with_projects(projects)),
        Arc::new(cache),
    )
    .summary(&ctx)
    .await
    .expect("summary");

    assert_eq!(summary.total_projects, 0);
}

#[tokio::test]
async fn test_cache_miss_builds_and_stores_the_summary() {
    let ctx = admin_tenant();
    let site = project(ctx.company.id, 2_000_000);
    let spent = vec![expense(&site, 300_000), expense(&site, 200_000)];
    let key = dashboard_key(ctx.company.id);

    let mut cache = MockCacheStore::new();
    cache.expect_get().returning(|_| Ok(None));
    cache
        .expect_set()
        .times(1)
        .withf(move |k, json, ttl| {
            k == key && *ttl == DASHBOARD_CACHE_TTL_SECONDS && json.contains("\"total_expenses\":500000")
        })
        .returning(|_, _, _| Ok(()));
    let mut projects = MockProjectRepository::new();
    projects
        .expect_list_all()
        .times(1)
        .returning(move |_| Ok(vec![site.clone()]));
    let mut expenses = MockExpenseRepository::new();
    expenses
        .expect_list_all()
        .times(1)
        .returning(move |_| Ok(spent.clone()));
    expenses.expect_list_categories().returning(|_| Ok(vec![]));

    let summary = DashboardManager::new(
        Arc::new(
            TestUnitOfWork::default()
                .with_projects(projects)
                .with_expenses(expenses),
        ),
        Arc::new(cache),
    )
    .summary(&ctx)
    .await
    .expect("summary");

    assert_eq!(summary.total_budget, 2_000_000);
    assert_eq!(summary.total_expenses, 500_000);
    assert_eq!(summary.budget_variance, 1_500_000);
    assert_eq!(summary.budget_utilization, 25.0);
}

#[tokio::test]
async fn test_zero_budget_reports_zero_utilization() {
    let ctx = admin_tenant();
    let site = project(ctx.company.id, 0);
    let spent = vec![expense(&site, 75_000)];

    let mut cache = MockCacheStore::new();
    cache
        .expect_get()
        .returning(|_| Err(AppError::Cache("connection refused".to_string())));
    cache.expect_set().returning(|_, _, _| Ok(()));
    let mut projects = MockProjectRepository::new();
    projects
        .expect_list_all()
        .returning(move |_| Ok(vec![site.clone()]));
    let mut expenses = MockExpenseRepository::new();
    expenses
        .expect_list_all()
        .returning(move |_| Ok(spent.clone()));
    expenses.expect_list_categories().returning(|_| Ok(vec![]));

    let summary = DashboardManager::new(
        Arc::new(
            TestUnitOfWork::default()
                .with_projects(projects)
                .with_expenses(expenses),
        ),
        Arc::new(cache),
    )
    .summary(&ctx)
    .await
    .expect("an unreachable cache reads as a miss");

    assert_eq!(summary.budget_utilization, 0.0);
    assert_eq!(summary.budget_variance, -75_000);
}

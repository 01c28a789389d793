//! Project and expense tracking tests.

mod common;

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use construction_tracker::config::MAX_MONEY_AMOUNT;
use construction_tracker::domain::{Expense, ExpenseInput, ExpenseStatus, Project, ProjectInput};
use construction_tracker::errors::AppError;
use construction_tracker::infra::repositories::{MockExpenseRepository, MockProjectRepository};
use construction_tracker::infra::MockCacheStore;
use construction_tracker::services::{ExpenseManager, ExpenseService, ProjectManager, ProjectService};

use common::{admin_tenant, quiet_notifier, supervisor_tenant, tenant_with, TestUnitOfWork};

fn project_input(name: &str) -> ProjectInput {
    ProjectInput {
        name: name.to_string(),
        description: None,
        location: Some("Lekki".to_string()),
        status: None,
        priority: None,
        start_date: None,
        end_date: None,
        expected_completion_date: None,
        total_budget: 1_000_000,
        client_name: None,
        client_email: None,
        client_phone: None,
        progress_percentage: None,
    }
}

fn expense_input(project_id: Uuid, actual_cost: i64) -> ExpenseInput {
    ExpenseInput {
        project_id,
        category_id: None,
        contractor_id: None,
        name: "Cement bags".to_string(),
        description: None,
        expense_type: None,
        status: None,
        planned_cost: 200_000,
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
    }
}

/// Cache expecting exactly one dashboard invalidation
fn invalidating_cache() -> MockCacheStore {
    let mut cache = MockCacheStore::new();
    cache
        .expect_delete()
        .times(1)
        .withf(|key| key.starts_with("dashboard:"))
        .returning(|_| Ok(()));
    cache
}

#[tokio::test]
async fn test_supervisor_cannot_create_projects() {
    let service = ProjectManager::new(
        Arc::new(TestUnitOfWork::default()),
        Arc::new(MockCacheStore::new()),
    );
    let result = service
        .create(&supervisor_tenant(), project_input("Lekki Duplex"))
        .await;

    assert!(matches!(result, Err(AppError::PermissionDenied(_))));
}

#[tokio::test]
async fn test_duplicate_project_name_conflicts() {
    let mut projects = MockProjectRepository::new();
    projects
        .expect_name_taken()
        .withf(|_, name, exclude| name == "Lekki Duplex" && exclude.is_none())
        .returning(|_, _, _| Ok(true));
    projects.expect_create().never();

    let service = ProjectManager::new(
        Arc::new(TestUnitOfWork::default().with_projects(projects)),
        Arc::new(MockCacheStore::new()),
    );
    let result = service
        .create(&admin_tenant(), project_input("  Lekki Duplex "))
        .await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn test_project_end_before_start_is_invalid() {
    let mut projects = MockProjectRepository::new();
    projects.expect_name_taken().returning(|_, _, _| Ok(false));

    let service = ProjectManager::new(
        Arc::new(TestUnitOfWork::default().with_projects(projects)),
        Arc::new(MockCacheStore::new()),
    );
    let today = Utc::now().date_naive();
    let mut input = project_input("Backwards");
    input.start_date = Some(today);
    input.end_date = Some(today - chrono::Duration::days(3));

    let result = service.create(&admin_tenant(), input).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_project_create_scopes_to_company_and_invalidates_dashboard() {
    let ctx = admin_tenant();
    let company_id = ctx.company.id;

    let mut projects = MockProjectRepository::new();
    projects.expect_name_taken().returning(|_, _, _| Ok(false));
    projects
        .expect_create()
        .times(1)
        .withf(move |p| p.company_id == company_id && p.name == "Lekki Duplex")
        .returning(Ok);

    let service = ProjectManager::new(
        Arc::new(TestUnitOfWork::default().with_projects(projects)),
        Arc::new(invalidating_cache()),
    );
    let project = service
        .create(&ctx, project_input("Lekki Duplex"))
        .await
        .expect("project created");

    assert_eq!(project.created_by, ctx.user_id);
    assert_eq!(project.progress_percentage, 0);
}

#[tokio::test]
async fn test_project_detail_reports_financials() {
    let ctx = admin_tenant();
    let project = Project::new(ctx.company.id, ctx.user_id, project_input("Lekki Duplex"))
        .expect("valid project");
    let project_id = project.id;
    let today = Utc::now().date_naive();
    let spent = vec![
        Expense::new(ctx.company.id, ctx.user_id, expense_input(project_id, 300_000), today),
        Expense::new(ctx.company.id, ctx.user_id, expense_input(project_id, 450_000), today),
    ];

    let mut projects = MockProjectRepository::new();
    projects
        .expect_find()
        .returning(move |_, _| Ok(Some(project.clone())));
    projects.expect_list_assignments().returning(|_| Ok(vec![]));
    let mut expenses = MockExpenseRepository::new();
    expenses
        .expect_list_for_project()
        .returning(move |_| Ok(spent.clone()));

    let service = ProjectManager::new(
        Arc::new(
            TestUnitOfWork::default()
                .with_projects(projects)
                .with_expenses(expenses),
        ),
        Arc::new(MockCacheStore::new()),
    );
    let detail = service.get(&ctx, project_id).await.expect("detail loads");

    assert_eq!(detail.financials.total_expenses, 750_000);
    assert_eq!(detail.financials.total_planned_expenses, 400_000);
    assert_eq!(detail.financials.budget_variance, 250_000);
    assert!(!detail.financials.is_over_budget);
    assert_eq!(detail.financials.budget_utilization, 75.0);
}

#[tokio::test]
async fn test_project_from_another_company_is_not_found() {
    let mut projects = MockProjectRepository::new();
    projects.expect_find().returning(|_, _| Ok(None));

    let service = ProjectManager::new(
        Arc::new(TestUnitOfWork::default().with_projects(projects)),
        Arc::new(MockCacheStore::new()),
    );
    let result = service.get(&admin_tenant(), Uuid::new_v4()).await;

    assert!(matches!(result, Err(AppError::NotFound)));
}

#[tokio::test]
async fn test_expense_against_foreign_project_is_invalid() {
    let mut projects = MockProjectRepository::new();
    projects.expect_find().returning(|_, _| Ok(None));
    let mut expenses = MockExpenseRepository::new();
    expenses.expect_create().never();

    let service = ExpenseManager::new(
        Arc::new(
            TestUnitOfWork::default()
                .with_projects(projects)
                .with_expenses(expenses),
        ),
        Arc::new(MockCacheStore::new()),
        quiet_notifier(),
    );
    let result = service
        .create(&admin_tenant(), expense_input(Uuid::new_v4(), 10_000))
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_employee_creates_expense_with_derived_cost() {
    let ctx = tenant_with(2);
    let project = Project::new(ctx.company.id, ctx.user_id, project_input("Lekki Duplex"))
        .expect("valid project");
    let project_id = project.id;

    let mut projects = MockProjectRepository::new();
    projects
        .expect_find()
        .returning(move |_, _| Ok(Some(project.clone())));
    let mut expenses = MockExpenseRepository::new();
    expenses.expect_create().times(1).returning(Ok);
    expenses.expect_list_for_project().returning(|_| Ok(vec![]));

    let service = ExpenseManager::new(
        Arc::new(
            TestUnitOfWork::default()
                .with_projects(projects)
                .with_expenses(expenses),
        ),
        Arc::new(invalidating_cache()),
        quiet_notifier(),
    );

    let mut input = expense_input(project_id, 0);
    input.unit_cost = 4_500;
    input.quantity = Some(40.0);
    let view = service.create(&ctx, input).await.expect("expense created");

    assert_eq!(view.expense.actual_cost, 180_000);
    assert_eq!(view.expense.status, ExpenseStatus::Planned);
    assert_eq!(view.cost_variance, -20_000);
    assert!(!view.is_over_budget);
}

#[tokio::test]
async fn test_employee_cannot_approve_expenses() {
    let service = ExpenseManager::new(
        Arc::new(TestUnitOfWork::default()),
        Arc::new(MockCacheStore::new()),
        quiet_notifier(),
    );
    let result = service.approve(&tenant_with(2), Uuid::new_v4()).await;

    assert!(matches!(result, Err(AppError::PermissionDenied(_))));
}

#[tokio::test]
async fn test_paid_expense_cannot_be_approved() {
    let ctx = admin_tenant();
    let mut expense = Expense::new(
        ctx.company.id,
        ctx.user_id,
        expense_input(Uuid::new_v4(), 5_000),
        Utc::now().date_naive(),
    );
    expense
        .mark_paid(Utc::now().date_naive())
        .expect("planned expense can be paid");
    let expense_id = expense.id;

    let mut expenses = MockExpenseRepository::new();
    expenses
        .expect_find()
        .returning(move |_, _| Ok(Some(expense.clone())));
    expenses.expect_update().never();

    let service = ExpenseManager::new(
        Arc::new(TestUnitOfWork::default().with_expenses(expenses)),
        Arc::new(MockCacheStore::new()),
        quiet_notifier(),
    );
    let result = service.approve(&ctx, expense_id).await;

    assert!(matches!(result, Err(AppError::Business(_))));
}

#[tokio::test]
async fn test_employee_cannot_create_an_approved_expense() {
    let ctx = tenant_with(2);
    let project = Project::new(ctx.company.id, ctx.user_id, project_input("Lekki Duplex"))
        .expect("valid project");
    let project_id = project.id;

    let mut projects = MockProjectRepository::new();
    projects
        .expect_find()
        .returning(move |_, _| Ok(Some(project.clone())));
    let mut expenses = MockExpenseRepository::new();
    expenses.expect_create().never();

    let service = ExpenseManager::new(
        Arc::new(
            TestUnitOfWork::default()
                .with_projects(projects)
                .with_expenses(expenses),
        ),
        Arc::new(MockCacheStore::new()),
        quiet_notifier(),
    );
    let mut input = expense_input(project_id, 50_000);
    input.status = Some(ExpenseStatus::Approved);
    let result = service.create(&ctx, input).await;

    assert!(matches!(result, Err(AppError::PermissionDenied(_))));
}

#[tokio::test]
async fn test_employee_cannot_mark_paid_through_an_edit() {
    let ctx = tenant_with(2);
    let project = Project::new(ctx.company.id, ctx.user_id, project_input("Lekki Duplex"))
        .expect("valid project");
    let existing = Expense::new(
        ctx.company.id,
        ctx.user_id,
        expense_input(project.id, 50_000),
        Utc::now().date_naive(),
    );
    let (project_id, expense_id) = (project.id, existing.id);

    let mut projects = MockProjectRepository::new();
    projects
        .expect_find()
        .returning(move |_, _| Ok(Some(project.clone())));
    let mut expenses = MockExpenseRepository::new();
    expenses
        .expect_find()
        .returning(move |_, _| Ok(Some(existing.clone())));
    expenses.expect_update().never();

    let service = ExpenseManager::new(
        Arc::new(
            TestUnitOfWork::default()
                .with_projects(projects)
                .with_expenses(expenses),
        ),
        Arc::new(MockCacheStore::new()),
        quiet_notifier(),
    );
    let mut input = expense_input(project_id, 50_000);
    input.status = Some(ExpenseStatus::Paid);
    let result = service.update(&ctx, expense_id, input).await;

    assert!(matches!(result, Err(AppError::PermissionDenied(_))));
}

#[tokio::test]
async fn test_admin_can_record_an_expense_as_approved() {
    let ctx = admin_tenant();
    let project = Project::new(ctx.company.id, ctx.user_id, project_input("Lekki Duplex"))
        .expect("valid project");
    let project_id = project.id;

    let mut projects = MockProjectRepository::new();
    projects
        .expect_find()
        .returning(move |_, _| Ok(Some(project.clone())));
    let mut expenses = MockExpenseRepository::new();
    expenses.expect_create().times(1).returning(Ok);
    expenses.expect_list_for_project().returning(|_| Ok(vec![]));

    let service = ExpenseManager::new(
        Arc::new(
            TestUnitOfWork::default()
                .with_projects(projects)
                .with_expenses(expenses),
        ),
        Arc::new(invalidating_cache()),
        quiet_notifier(),
    );
    let mut input = expense_input(project_id, 50_000);
    input.status = Some(ExpenseStatus::Approved);
    let view = service.create(&ctx, input).await.expect("expense created");

    assert_eq!(view.expense.status, ExpenseStatus::Approved);
    assert_eq!(view.expense.approved_by, Some(ctx.user_id));
}

#[tokio::test]
async fn test_oversized_derived_amount_is_invalid() {
    let mut expenses = MockExpenseRepository::new();
    expenses.expect_create().never();

    let service = ExpenseManager::new(
        Arc::new(TestUnitOfWork::default().with_expenses(expenses)),
        Arc::new(MockCacheStore::new()),
        quiet_notifier(),
    );
    let mut input = expense_input(Uuid::new_v4(), 0);
    input.unit_cost = MAX_MONEY_AMOUNT / 2;
    input.quantity = Some(3.0);
    let result = service.create(&admin_tenant(), input).await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

//! In-app notification tests: the events services raise and the inbox.

mod common;

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use construction_tracker::config::Config;
use construction_tracker::domain::{
    Audience, Expense, ExpenseInput, Membership, Notification, NotificationKind,
    NotificationPreference, NotificationPriority, Project, ProjectInput,
};
use construction_tracker::errors::AppError;
use construction_tracker::infra::repositories::{
    MockAccessRepository, MockExpenseRepository, MockNotificationRepository,
    MockProjectRepository, MockUserRepository,
};
use construction_tracker::jobs::MockMailer;
use construction_tracker::services::{
    ExpenseManager, ExpenseService, InviteMemberRequest, MemberUpdate, NotificationCenter,
    NotificationService, Notifier, TenancyService, TenantManager,
};

use common::{
    admin_tenant, company_roles, permissive_cache, quiet_notifier, user, TestUnitOfWork,
};

fn project_input(total_budget: i64) -> ProjectInput {
    ProjectInput {
        name: "Lekki Duplex".to_string(),
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
    }
}

fn expense_input(project_id: Uuid, actual_cost: i64) -> ExpenseInput {
    ExpenseInput {
        project_id,
        category_id: None,
        contractor_id: None,
        name: "Roofing sheets".to_string(),
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
    }
}

fn project_lookup(project: Project) -> MockProjectRepository {
    let mut projects = MockProjectRepository::new();
    projects
        .expect_find()
        .returning(move |_, _| Ok(Some(project.clone())));
    projects
}

/// Expense repository holding one stored expense that can be approved
fn stored_expense(expense: Expense) -> MockExpenseRepository {
    let mut expenses = MockExpenseRepository::new();
    expenses
        .expect_find()
        .returning(move |_, _| Ok(Some(expense.clone())));
    expenses.expect_update().returning(Ok);
    expenses
}

fn expense_by(author: Uuid, company_id: Uuid) -> Expense {
    Expense::new(
        company_id,
        author,
        expense_input(Uuid::new_v4(), 40_000),
        Utc::now().date_naive(),
    )
}

#[tokio::test]
async fn test_new_expense_notifies_supervisors_except_the_author() {
    let ctx = admin_tenant();
    let actor = ctx.user_id;
    let supervisor = Uuid::new_v4();
    let project = Project::new(ctx.company.id, actor, project_input(0)).expect("valid project");
    let project_id = project.id;

    let mut expenses = MockExpenseRepository::new();
    expenses.expect_create().times(1).returning(Ok);
    let mut notifications = MockNotificationRepository::new();
    notifications
        .expect_recipients()
        .withf(|_, audience| *audience == Audience::Supervisors)
        .returning(move |_, _| Ok(vec![actor, supervisor]));
    notifications.expect_preferences().returning(|_, _, _| Ok(vec![]));
    notifications
        .expect_create_many()
        .times(1)
        .withf(move |batch| {
            batch.len() == 1
                && batch[0].recipient_id == supervisor
                && batch[0].kind == NotificationKind::ExpenseCreated
                && batch[0].sender_id == Some(actor)
                && batch[0].message.contains("Lekki Duplex")
        })
        .returning(|batch| Ok(batch.len() as u64));

    let service = ExpenseManager::new(
        Arc::new(
            TestUnitOfWork::default()
                .with_projects(project_lookup(project))
                .with_expenses(expenses)
                .with_notifications(notifications),
        ),
        Arc::new(permissive_cache()),
        quiet_notifier(),
    );
    service
        .create(&ctx, expense_input(project_id, 25_000))
        .await
        .expect("expense created");
}

#[tokio::test]
async fn test_crossing_the_budget_alert_notifies_managers_in_app_and_by_email() {
    let ctx = admin_tenant();
    let manager = user("site_manager", "hash", true);
    let manager_id = manager.id;
    let project =
        Project::new(ctx.company.id, ctx.user_id, project_input(1_000_000)).expect("valid project");
    let project_id = project.id;

    let earlier = Expense::new(
        ctx.company.id,
        ctx.user_id,
        expense_input(project_id, 850_000),
        Utc::now().date_naive(),
    );
    let mut expenses = MockExpenseRepository::new();
    expenses.expect_create().times(1).returning(Ok);
    expenses.expect_list_for_project().returning(move |_| {
        let latest = Expense::new(
            earlier.company_id,
            earlier.created_by,
            expense_input(earlier.project_id, 100_000),
            Utc::now().date_naive(),
        );
        Ok(vec![earlier.clone(), latest])
    });

    let mut notifications = MockNotificationRepository::new();
    notifications
        .expect_recipients()
        .returning(move |_, audience| match audience {
            Audience::Managers => Ok(vec![manager_id]),
            Audience::Supervisors => Ok(vec![]),
        });
    notifications.expect_preferences().returning(|_, _, _| Ok(vec![]));
    notifications
        .expect_create_many()
        .times(1)
        .withf(move |batch| {
            batch.len() == 1
                && batch[0].recipient_id == manager_id
                && batch[0].kind == NotificationKind::BudgetWarning
                && batch[0].priority == NotificationPriority::High
                && batch[0].message.contains("95.0%")
        })
        .returning(|batch| Ok(batch.len() as u64));

    let mut users = MockUserRepository::new();
    users
        .expect_find_by_ids()
        .returning(move |_| Ok(vec![manager.clone()]));
    let mut mailer = MockMailer::new();
    mailer
        .expect_send()
        .times(1)
        .withf(|email| {
            email.to == "site_manager@example.com" && email.subject.contains("Budget Warning")
        })
        .returning(|_| Ok(()));

    let service = ExpenseManager::new(
        Arc::new(
            TestUnitOfWork::default()
                .with_projects(project_lookup(project))
                .with_expenses(expenses)
                .with_notifications(notifications)
                .with_users(users),
        ),
        Arc::new(permissive_cache()),
        Notifier::new(Arc::new(mailer), "noreply@example.com"),
    );
    service
        .create(&ctx, expense_input(project_id, 100_000))
        .await
        .expect("expense created");
}

#[tokio::test]
async fn test_spending_already_over_the_line_raises_no_new_alert() {
    let ctx = admin_tenant();
    let project =
        Project::new(ctx.company.id, ctx.user_id, project_input(1_000_000)).expect("valid project");
    let project_id = project.id;

    let mut expenses = MockExpenseRepository::new();
    expenses.expect_create().returning(Ok);
    expenses.expect_list_for_project().returning(move |_| {
        Ok(vec![Expense::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            expense_input(project_id, 990_000),
            Utc::now().date_naive(),
        )])
    });
    let mut notifications = MockNotificationRepository::new();
    notifications
        .expect_recipients()
        .withf(|_, audience| *audience == Audience::Supervisors)
        .returning(|_, _| Ok(vec![]));
    notifications.expect_create_many().never();

    let service = ExpenseManager::new(
        Arc::new(
            TestUnitOfWork::default()
                .with_projects(project_lookup(project))
                .with_expenses(expenses)
                .with_notifications(notifications),
        ),
        Arc::new(permissive_cache()),
        quiet_notifier(),
    );
    service
        .create(&ctx, expense_input(project_id, 20_000))
        .await
        .expect("expense created");
}

#[tokio::test]
async fn test_approval_notifies_the_author() {
    let ctx = admin_tenant();
    let author = Uuid::new_v4();
    let expense = expense_by(author, ctx.company.id);
    let expense_id = expense.id;

    let mut notifications = MockNotificationRepository::new();
    notifications.expect_preferences().returning(|_, _, _| Ok(vec![]));
    notifications
        .expect_create_many()
        .times(1)
        .withf(move |batch| {
            batch.len() == 1
                && batch[0].recipient_id == author
                && batch[0].kind == NotificationKind::ExpenseApproved
                && batch[0].object_id == Some(expense_id)
        })
        .returning(|batch| Ok(batch.len() as u64));

    let service = ExpenseManager::new(
        Arc::new(
            TestUnitOfWork::default()
                .with_expenses(stored_expense(expense))
                .with_notifications(notifications),
        ),
        Arc::new(permissive_cache()),
        quiet_notifier(),
    );
    service.approve(&ctx, expense_id).await.expect("approved");
}

#[tokio::test]
async fn test_approving_your_own_expense_sends_nothing() {
    let ctx = admin_tenant();
    let expense = expense_by(ctx.user_id, ctx.company.id);
    let expense_id = expense.id;

    let mut notifications = MockNotificationRepository::new();
    notifications.expect_create_many().never();

    let service = ExpenseManager::new(
        Arc::new(
            TestUnitOfWork::default()
                .with_expenses(stored_expense(expense))
                .with_notifications(notifications),
        ),
        Arc::new(permissive_cache()),
        quiet_notifier(),
    );
    service.approve(&ctx, expense_id).await.expect("approved");
}

#[tokio::test]
async fn test_disabled_in_app_preference_skips_storage() {
    let ctx = admin_tenant();
    let author = Uuid::new_v4();
    let company_id = ctx.company.id;
    let expense = expense_by(author, company_id);
    let expense_id = expense.id;

    let mut muted =
        NotificationPreference::default_for(author, company_id, NotificationKind::ExpenseApproved);
    muted.in_app_enabled = false;
    let mut notifications = MockNotificationRepository::new();
    notifications
        .expect_preferences()
        .withf(|_, _, kind| *kind == Some(NotificationKind::ExpenseApproved))
        .returning(move |_, _, _| Ok(vec![muted.clone()]));
    notifications
        .expect_create_many()
        .withf(|batch| batch.is_empty())
        .returning(|_| Ok(0));

    let service = ExpenseManager::new(
        Arc::new(
            TestUnitOfWork::default()
                .with_expenses(stored_expense(expense))
                .with_notifications(notifications),
        ),
        Arc::new(permissive_cache()),
        quiet_notifier(),
    );
    service.approve(&ctx, expense_id).await.expect("approved");
}

#[tokio::test]
async fn test_failed_notification_write_does_not_fail_the_approval() {
    let ctx = admin_tenant();
    let expense = expense_by(Uuid::new_v4(), ctx.company.id);
    let expense_id = expense.id;

    let mut notifications = MockNotificationRepository::new();
    notifications.expect_preferences().returning(|_, _, _| Ok(vec![]));
    notifications
        .expect_create_many()
        .returning(|_| Err(AppError::internal("database unavailable")));

    let service = ExpenseManager::new(
        Arc::new(
            TestUnitOfWork::default()
                .with_expenses(stored_expense(expense))
                .with_notifications(notifications),
        ),
        Arc::new(permissive_cache()),
        quiet_notifier(),
    );
    let view = service.approve(&ctx, expense_id).await.expect("approved");

    assert!(view.expense.approved_by.is_some());
}

#[tokio::test]
async fn test_role_change_notifies_the_member() {
    let ctx = admin_tenant();
    let roles = company_roles(ctx.company.id);
    let (supervisor_id, employee_id) = (roles[1].id, roles[2].id);

    let member = user("foreman", "hash", true);
    let member_id = member.id;
    let target = Membership::new(member.id, ctx.company.id, supervisor_id, Some(ctx.user_id));
    let target_id = target.id;

    let mut access = MockAccessRepository::new();
    access
        .expect_find_role()
        .returning(move |_, id| Ok(roles.iter().find(|r| r.id == id).cloned()));
    access
        .expect_find_membership_by_id()
        .returning(move |_, _| Ok(Some(target.clone())));
    access.expect_update_membership().returning(Ok);
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .returning(move |_| Ok(Some(member.clone())));

    let mut notifications = MockNotificationRepository::new();
    notifications.expect_preferences().returning(|_, _, _| Ok(vec![]));
    notifications
        .expect_create_many()
        .times(1)
        .withf(move |batch| {
            batch.len() == 1
                && batch[0].recipient_id == member_id
                && batch[0].kind == NotificationKind::RoleChanged
                && batch[0].message.contains("from Supervisor to Employee")
        })
        .returning(|batch| Ok(batch.len() as u64));

    let service = TenantManager::new(
        Arc::new(
            TestUnitOfWork::default()
                .with_access(access)
                .with_users(users)
                .with_notifications(notifications),
        ),
        quiet_notifier(),
        Config::for_tests(),
    );
    service
        .update_member(
            &ctx,
            target_id,
            MemberUpdate {
                role_id: Some(employee_id),
                status: None,
            },
        )
        .await
        .expect("role changed");
}

#[tokio::test]
async fn test_inviting_an_existing_user_welcomes_them() {
    let ctx = admin_tenant();
    let roles = company_roles(ctx.company.id);
    let employee_id = roles[2].id;
    let invitee = user("mason", "hash", true);
    let invitee_id = invitee.id;

    let mut access = MockAccessRepository::new();
    access
        .expect_find_role()
        .returning(move |_, id| Ok(roles.iter().find(|r| r.id == id).cloned()));
    access.expect_find_membership().returning(|_, _| Ok(None));
    access.expect_create_membership().times(1).returning(Ok);
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_email()
        .returning(move |_| Ok(Some(invitee.clone())));

    let mut notifications = MockNotificationRepository::new();
    notifications.expect_preferences().returning(|_, _, _| Ok(vec![]));
    notifications
        .expect_create_many()
        .times(1)
        .withf(move |batch| {
            batch.len() == 1
                && batch[0].recipient_id == invitee_id
                && batch[0].kind == NotificationKind::UserInvited
                && batch[0].title == "Welcome to Acme Builders"
        })
        .returning(|batch| Ok(batch.len() as u64));

    let service = TenantManager::new(
        Arc::new(
            TestUnitOfWork::default()
                .with_access(access)
                .with_users(users)
                .with_notifications(notifications),
        ),
        quiet_notifier(),
        Config::for_tests(),
    );
    service
        .invite_member(
            &ctx,
            InviteMemberRequest {
                email: "mason@example.com".to_string(),
                role_id: employee_id,
                username: None,
                first_name: None,
                last_name: None,
            },
        )
        .await
        .expect("member invited");
}

fn inbox(notifications: MockNotificationRepository) -> NotificationCenter<TestUnitOfWork> {
    NotificationCenter::new(
        Arc::new(TestUnitOfWork::default().with_notifications(notifications)),
        quiet_notifier(),
    )
}

#[tokio::test]
async fn test_notification_from_another_company_is_not_found() {
    let ctx = admin_tenant();
    let elsewhere = Notification::new(
        Uuid::new_v4(),
        ctx.user_id,
        NotificationKind::RoleChanged,
        "Your Role Has Been Updated",
        "Changed",
    );
    let id = elsewhere.id;

    let mut notifications = MockNotificationRepository::new();
    notifications
        .expect_find()
        .returning(move |_, _| Ok(Some(elsewhere.clone())));
    notifications.expect_update().never();

    let result = inbox(notifications).mark_read(&ctx, id).await;

    assert!(matches!(result, Err(AppError::NotFound)));
}

#[tokio::test]
async fn test_marking_a_read_notification_again_writes_nothing() {
    let ctx = admin_tenant();
    let mut read = Notification::new(
        ctx.company.id,
        ctx.user_id,
        NotificationKind::UserInvited,
        "Welcome to Acme Builders",
        "Joined",
    );
    let first_read = Utc::now() - chrono::Duration::hours(2);
    read.mark_read(first_read);
    let id = read.id;

    let mut notifications = MockNotificationRepository::new();
    notifications
        .expect_find()
        .returning(move |_, _| Ok(Some(read.clone())));
    notifications.expect_update().never();

    let notification = inbox(notifications)
        .mark_read(&ctx, id)
        .await
        .expect("still readable");

    assert_eq!(notification.read_at, Some(first_read));
}

#[tokio::test]
async fn test_preferences_list_every_kind_with_defaults() {
    let ctx = admin_tenant();
    let mut muted = NotificationPreference::default_for(
        ctx.user_id,
        ctx.company.id,
        NotificationKind::ExpenseCreated,
    );
    muted.in_app_enabled = false;

    let mut notifications = MockNotificationRepository::new();
    notifications
        .expect_preferences()
        .returning(move |_, _, _| Ok(vec![muted.clone()]));

    let preferences = inbox(notifications)
        .preferences(&ctx)
        .await
        .expect("preferences");

    assert_eq!(preferences.len(), NotificationKind::ALL.len());
    let created = preferences
        .iter()
        .find(|p| p.kind == NotificationKind::ExpenseCreated)
        .expect("expense_created entry");
    assert!(!created.in_app_enabled);
    let budget = preferences
        .iter()
        .find(|p| p.kind == NotificationKind::BudgetWarning)
        .expect("budget_warning entry");
    assert!(budget.in_app_enabled && budget.email_enabled);
}

#[tokio::test]
async fn test_empty_preference_update_is_invalid() {
    let result = inbox(MockNotificationRepository::new())
        .update_preferences(&admin_tenant(), vec![])
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

//! Super-owner console tests: account toggles, company scope, analytics
//! and CSV exports.

mod common;

use std::sync::Arc;

use chrono::Utc;
use mockall::predicate::{always, eq};
use uuid::Uuid;

use construction_tracker::domain::{
    AccountType, Company, DelegationLevel, NewCompany, RequestStatus, SuperOwner,
    SuperOwnerFlags, UserProfile,
};
use construction_tracker::errors::AppError;
use construction_tracker::infra::repositories::{
    MockAccessRepository, MockCompanyRepository, MockExpenseRepository, MockProjectRepository,
    MockRegistrationRepository, MockSuperOwnerRepository, MockUserRepository,
};
use construction_tracker::services::{
    ExportKind, NewSuperOwnerRequest, SuperOwnerConsole, SuperOwnerService,
};
use construction_tracker::types::PaginationParams;

use common::{company_request, primary_owner, user, TestUnitOfWork};

fn console(uow: TestUnitOfWork) -> SuperOwnerConsole<TestUnitOfWork> {
    SuperOwnerConsole::new(Arc::new(uow))
}

/// Company manager limited to the given companies
fn scoped_owner(companies: Vec<Uuid>) -> SuperOwner {
    SuperOwner::delegated(
        Uuid::new_v4(),
        DelegationLevel::CompanyManagement,
        None,
        companies,
        None,
    )
}

fn company(name: &str) -> Company {
    NewCompany {
        name: name.to_string(),
        slug: name.to_lowercase().replace(' ', "-"),
        email: Some(format!("info@{}.example", name.to_lowercase().replace(' ', ""))),
        ..NewCompany::default()
    }
    .into_company()
}

#[tokio::test]
async fn test_deactivating_a_super_owner_is_refused() {
    let target = user("delegate", "hash", true);
    let target_id = target.id;

    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .with(eq(target_id))
        .returning(move |_| Ok(Some(target.clone())));
    users.expect_update().never();
    let mut owners = MockSuperOwnerRepository::new();
    owners
        .expect_find_by_user()
        .with(eq(target_id))
        .returning(move |user_id| {
            Ok(Some(SuperOwner::delegated(
                user_id,
                DelegationLevel::ReadOnly,
                None,
                vec![],
                None,
            )))
        });

    let result = console(
        TestUnitOfWork::default()
            .with_users(users)
            .with_super_owners(owners),
    )
    .toggle_user_status(&primary_owner(), target_id)
    .await;

    assert!(matches!(result, Err(AppError::PermissionDenied(_))));
}

#[tokio::test]
async fn test_inactive_super_owner_can_be_reactivated() {
    let target = user("delegate", "hash", false);
    let target_id = target.id;
    let actor = primary_owner();
    let actor_id = actor.user_id;

    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .returning(move |_| Ok(Some(target.clone())));
    users
        .expect_update()
        .times(1)
        .withf(|user| user.is_active)
        .returning(Ok);
    users
        .expect_find_profile()
        .returning(move |id| Ok(Some(UserProfile::new(id, AccountType::Individual))));
    users
        .expect_save_profile()
        .times(1)
        .withf(move |profile| profile.is_account_active && profile.activated_by == Some(actor_id))
        .returning(Ok);

    let response = console(TestUnitOfWork::default().with_users(users))
        .toggle_user_status(&actor, target_id)
        .await
        .expect("reactivated");

    assert!(response.is_active);
}

#[tokio::test]
async fn test_regular_user_is_deactivated() {
    let target = user("mason", "hash", true);
    let target_id = target.id;

    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .returning(move |_| Ok(Some(target.clone())));
    users
        .expect_update()
        .times(1)
        .withf(|user| !user.is_active)
        .returning(Ok);
    users.expect_find_profile().never();
    let mut owners = MockSuperOwnerRepository::new();
    owners.expect_find_by_user().returning(|_| Ok(None));

    let response = console(
        TestUnitOfWork::default()
            .with_users(users)
            .with_super_owners(owners),
    )
    .toggle_user_status(&primary_owner(), target_id)
    .await
    .expect("deactivated");

    assert!(!response.is_active);
}

#[tokio::test]
async fn test_own_account_status_cannot_be_toggled() {
    let actor = primary_owner();
    let mut users = MockUserRepository::new();
    users.expect_find_by_id().never();

    let result = console(TestUnitOfWork::default().with_users(users))
        .toggle_user_status(&actor, actor.user_id)
        .await;

    assert!(matches!(result, Err(AppError::Business(_))));
}

#[tokio::test]
async fn test_scoped_owner_cannot_toggle_other_companies() {
    let allowed = Uuid::new_v4();
    let mut companies = MockCompanyRepository::new();
    companies.expect_find_by_id().never();
    companies.expect_update().never();

    let result = console(TestUnitOfWork::default().with_companies(companies))
        .toggle_company_status(&scoped_owner(vec![allowed]), Uuid::new_v4())
        .await;

    assert!(matches!(result, Err(AppError::PermissionDenied(_))));
}

#[tokio::test]
async fn test_scoped_owner_lists_only_allowed_companies() {
    let visible = company("Acme Builders");
    let allowed = visible.id;

    let mut companies = MockCompanyRepository::new();
    companies
        .expect_list()
        .times(1)
        .withf(move |search, scope, _| search.is_none() && *scope == Some(vec![allowed]))
        .returning(move |_, _, _| Ok((vec![visible.clone()], 1)));

    let page = console(TestUnitOfWork::default().with_companies(companies))
        .list_companies(&scoped_owner(vec![allowed]), None, PaginationParams::default())
        .await
        .expect("companies listed");

    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].id, allowed);
}

#[tokio::test]
async fn test_system_analytics_counts_open_requests_as_pending() {
    let mut users = MockUserRepository::new();
    users
        .expect_count()
        .returning(|active_only| Ok(if active_only { 9 } else { 12 }));
    let mut companies = MockCompanyRepository::new();
    companies
        .expect_count()
        .returning(|active_only| Ok(if active_only { 3 } else { 4 }));
    let mut projects = MockProjectRepository::new();
    projects
        .expect_count()
        .with(eq(None), always())
        .returning(|_, active_only| Ok(if active_only { 5 } else { 7 }));
    let mut expenses = MockExpenseRepository::new();
    expenses
        .expect_total_actual()
        .with(eq(None))
        .returning(|_| Ok(2_500_000));
    let mut registrations = MockRegistrationRepository::new();
    registrations.expect_count_by_status().returning(|| {
        Ok(vec![
            (RequestStatus::Pending, 2),
            (RequestStatus::DocumentsRequired, 1),
            (RequestStatus::Approved, 6),
        ])
    });

    let analytics = console(
        TestUnitOfWork::default()
            .with_users(users)
            .with_companies(companies)
            .with_projects(projects)
            .with_expenses(expenses)
            .with_registrations(registrations),
    )
    .system_analytics(&primary_owner())
    .await
    .expect("analytics");

    assert_eq!((analytics.total_users, analytics.active_users), (12, 9));
    assert_eq!((analytics.total_companies, analytics.active_companies), (4, 3));
    assert_eq!((analytics.total_projects, analytics.active_projects), (7, 5));
    assert_eq!(analytics.total_expenses, 2_500_000);
    assert_eq!(analytics.pending_requests, 3);
    assert_eq!(analytics.requests_by_status.len(), RequestStatus::ALL.len());
    let expired = analytics
        .requests_by_status
        .iter()
        .find(|c| c.status == RequestStatus::Expired)
        .expect("expired row");
    assert_eq!(expired.count, 0);
}

#[tokio::test]
async fn test_company_export_is_limited_to_scope() {
    let visible = company("Acme Builders");
    let allowed = visible.id;

    let mut companies = MockCompanyRepository::new();
    companies
        .expect_all()
        .times(1)
        .withf(move |scope| *scope == Some(vec![allowed]))
        .returning(move |_| Ok(vec![visible.clone()]));
    let mut access = MockAccessRepository::new();
    access
        .expect_member_counts()
        .withf(move |ids| ids == &vec![allowed])
        .returning(move |_| Ok(vec![(allowed, 4)]));

    let export = console(
        TestUnitOfWork::default()
            .with_companies(companies)
            .with_access(access),
    )
    .export(&scoped_owner(vec![allowed]), ExportKind::Companies)
    .await
    .expect("export");

    let csv = String::from_utf8(export.bytes).expect("utf-8");
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(export.filename, "companies.csv");
    assert_eq!(lines[0], "Name,Email,Description,Created,Active,Members");
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("Acme Builders,info@acmebuilders.example,-,"));
    assert!(lines[1].ends_with(",Yes,4"));
}

#[tokio::test]
async fn test_request_export_names_approver_only_for_approved_requests() {
    let mut reviewer = user("reviewer", "hash", true);
    reviewer.first_name = "Grace".to_string();
    reviewer.last_name = "Hopper".to_string();
    let reviewer_id = reviewer.id;

    let mut approved = company_request();
    approved.status = RequestStatus::Approved;
    approved.reviewed_by = Some(reviewer_id);
    let mut rejected = company_request();
    rejected.status = RequestStatus::Rejected;
    rejected.reviewed_by = Some(reviewer_id);

    let mut registrations = MockRegistrationRepository::new();
    registrations
        .expect_all()
        .returning(move || Ok(vec![approved.clone(), rejected.clone()]));
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_ids()
        .withf(move |ids| ids == &vec![reviewer_id])
        .returning(move |_| Ok(vec![reviewer.clone()]));

    let export = console(
        TestUnitOfWork::default()
            .with_registrations(registrations)
            .with_users(users),
    )
    .export(&primary_owner(), ExportKind::Requests)
    .await
    .expect("export");

    let csv = String::from_utf8(export.bytes).expect("utf-8");
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].ends_with(",approved,Grace Hopper"));
    assert!(lines[2].ends_with(",rejected,-"));
    assert!(lines[1].starts_with(&Utc::now().format("%Y-%m-%d").to_string()));
}

#[tokio::test]
async fn test_export_needs_analytics_flag() {
    let account_manager = SuperOwner::delegated(
        Uuid::new_v4(),
        DelegationLevel::UserManagement,
        None,
        vec![],
        None,
    );
    let mut users = MockUserRepository::new();
    users.expect_all().never();

    let result = console(TestUnitOfWork::default().with_users(users))
        .export(&account_manager, ExportKind::Users)
        .await;

    assert!(matches!(result, Err(AppError::PermissionDenied(_))));
}

#[tokio::test]
async fn test_delegate_cannot_grant_flags_they_lack() {
    let actor = scoped_owner(vec![]);
    let target = user("analyst", "hash", true);
    let target_id = target.id;

    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .returning(move |_| Ok(Some(target.clone())));
    let mut owners = MockSuperOwnerRepository::new();
    owners.expect_find_by_user().returning(|_| Ok(None));
    owners.expect_create().never();

    let result = console(
        TestUnitOfWork::default()
            .with_users(users)
            .with_super_owners(owners),
    )
    .create_super_owner(
        &SuperOwner {
            flags: SuperOwnerFlags {
                can_delegate_permissions: true,
                ..actor.flags
            },
            ..actor
        },
        NewSuperOwnerRequest {
            user_id: target_id,
            delegation_level: DelegationLevel::UserManagement,
            flags: None,
            allowed_company_ids: vec![],
        },
    )
    .await;

    assert!(matches!(result, Err(AppError::PermissionDenied(_))));
}

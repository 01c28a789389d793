//! Registration workflow tests.

mod common;

use std::sync::Arc;

use chrono::Utc;
use mockall::predicate::eq;
use uuid::Uuid;

use construction_tracker::config::Config;
use construction_tracker::domain::{
    AccountType, ClientMeta, Membership, NewCompany, RequestStatus, SuperOwner,
    SuperOwnerFlags, DelegationLevel, UserProfile,
};
use construction_tracker::errors::AppError;
use construction_tracker::infra::repositories::{
    MockRegistrationRepository, MockSuperOwnerRepository, MockUserRepository,
};
use construction_tracker::infra::{MockAccountProvisioner, ProvisionedAccount};
use construction_tracker::services::{
    BulkAction, BulkActionRequest, CompanyRegistrationForm, RegistrationManager,
    RegistrationService,
};

use common::{company_request, company_roles, expired_request, permissive_cache, primary_owner, quiet_notifier, TestUnitOfWork};

fn manager(uow: TestUnitOfWork) -> RegistrationManager<TestUnitOfWork> {
    RegistrationManager::new(
        Arc::new(uow),
        Arc::new(permissive_cache()),
        quiet_notifier(),
        Config::for_tests(),
    )
}

fn company_form() -> CompanyRegistrationForm {
    CompanyRegistrationForm {
        email: "owner@acme.example".to_string(),
        username: "acme_owner".to_string(),
        first_name: "Ada".to_string(),
        last_name: "Obi".to_string(),
        phone: None,
        company_name: " Acme Builders ".to_string(),
        company_description: None,
        company_website: None,
        company_address: Some("   ".to_string()),
        company_registration_number: None,
    }
}

/// Provisioner that builds what the transactional store would create
fn provisioner_creating_company() -> MockAccountProvisioner {
    let mut provisioner = MockAccountProvisioner::new();
    provisioner
        .expect_provision_registration()
        .times(1)
        .withf(|request, account| {
            request.status == RequestStatus::Approved
                && account.username == "acme_owner"
                && account.email == "owner@acme.example"
                && account.is_active
        })
        .returning(|mut request, account| {
            let user = account.into_user();
            let company = NewCompany {
                name: request.company_name.clone().unwrap_or_default(),
                slug: "acme-builders".to_string(),
                ..NewCompany::default()
            }
            .into_company();
            let roles = company_roles(company.id);
            let membership = Membership::new(user.id, company.id, roles[0].id, request.reviewed_by);
            let mut profile = UserProfile::new(user.id, AccountType::CompanyAdmin);
            profile.activate(request.reviewed_by, Utc::now());
            request.provisioned_user_id = Some(user.id);

            Ok(ProvisionedAccount {
                request,
                user,
                profile,
                company: Some(company),
                roles,
                membership: Some(membership),
            })
        });
    provisioner
}

#[tokio::test]
async fn test_submit_company_creates_pending_request() {
    let mut users = MockUserRepository::new();
    users
        .expect_exists()
        .times(1)
        .returning(|_, _| Ok(false));
    users.expect_find_by_ids().returning(|_| Ok(vec![]));

    let mut registrations = MockRegistrationRepository::new();
    registrations
        .expect_has_open_request()
        .returning(|_| Ok(false));
    registrations
        .expect_create()
        .times(1)
        .withf(|request| {
            request.status == RequestStatus::Pending
                && request.company_name.as_deref() == Some("Acme Builders")
                && request.company_address.is_none()
        })
        .returning(Ok);

    let mut owners = MockSuperOwnerRepository::new();
    owners.expect_list().returning(|| Ok(vec![]));

    let service = manager(
        TestUnitOfWork::default()
            .with_users(users)
            .with_registrations(registrations)
            .with_super_owners(owners),
    );

    let receipt = service
        .submit_company(company_form(), ClientMeta::default())
        .await
        .expect("submission accepted");

    assert_eq!(receipt.status, RequestStatus::Pending);
    assert!(!receipt.activation_token.is_empty());
    assert!(receipt.status_url.ends_with(&receipt.activation_token));
    assert!(receipt.expires_at > Utc::now());
}

#[tokio::test]
async fn test_submit_rejects_taken_username_or_email() {
    let mut users = MockUserRepository::new();
    users.expect_exists().returning(|_, _| Ok(true));

    let service = manager(TestUnitOfWork::default().with_users(users));
    let result = service
        .submit_company(company_form(), ClientMeta::default())
        .await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn test_submit_rejects_second_open_request() {
    let mut users = MockUserRepository::new();
    users.expect_exists().returning(|_, _| Ok(false));
    let mut registrations = MockRegistrationRepository::new();
    registrations
        .expect_has_open_request()
        .returning(|_| Ok(true));

    let service = manager(
        TestUnitOfWork::default()
            .with_users(users)
            .with_registrations(registrations),
    );
    let result = service
        .submit_company(company_form(), ClientMeta::default())
        .await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn test_approve_provisions_account_company_roles_and_membership() {
    let request = company_request();
    let request_id = request.id;

    let mut registrations = MockRegistrationRepository::new();
    registrations
        .expect_find_by_id()
        .with(eq(request_id))
        .returning(move |_| Ok(Some(request.clone())));

    let mut users = MockUserRepository::new();
    users.expect_exists().times(1).returning(|_, _| Ok(false));

    let service = manager(
        TestUnitOfWork::default()
            .with_registrations(registrations)
            .with_users(users)
            .with_provisioning(provisioner_creating_company()),
    );

    let owner = primary_owner();
    let outcome = service
        .approve(&owner, request_id)
        .await
        .expect("approval succeeds");

    assert_eq!(outcome.request.status, RequestStatus::Approved);
    assert_eq!(outcome.request.reviewed_by, Some(owner.user_id));
    assert_eq!(outcome.request.provisioned_user_id, Some(outcome.user.id));
    assert_eq!(outcome.user.username, "acme_owner");

    let company = outcome.company.expect("company created");
    assert_eq!(company.name, "Acme Builders");
    assert_eq!(outcome.roles.len(), 3);
    assert!(outcome.roles.iter().all(|r| r.company_id == company.id));
    assert_eq!(outcome.roles.iter().filter(|r| r.is_admin).count(), 1);

    let membership = outcome.membership.expect("owner membership");
    assert_eq!(membership.user_id, outcome.user.id);
    assert_eq!(membership.company_id, company.id);
    let admin = outcome.roles.iter().find(|r| r.is_admin).expect("admin role");
    assert_eq!(membership.role_id, admin.id);
}

#[tokio::test]
async fn test_approve_expired_request_persists_expiry() {
    let request = expired_request();
    let request_id = request.id;

    let mut registrations = MockRegistrationRepository::new();
    registrations
        .expect_find_by_id()
        .returning(move |_| Ok(Some(request.clone())));
    registrations
        .expect_update()
        .times(1)
        .withf(|request| request.status == RequestStatus::Expired)
        .returning(Ok);

    // Provisioning must never run; the default mock panics if it does
    let service = manager(TestUnitOfWork::default().with_registrations(registrations));
    let result = service.approve(&primary_owner(), request_id).await;

    assert!(matches!(result, Err(AppError::RequestExpired)));
}

#[tokio::test]
async fn test_approve_rejected_request_is_a_transition_error() {
    let mut request = company_request();
    request
        .reject(Uuid::new_v4(), "Incomplete".to_string(), Utc::now())
        .expect("open request can be rejected");
    let request_id = request.id;

    let mut registrations = MockRegistrationRepository::new();
    registrations
        .expect_find_by_id()
        .returning(move |_| Ok(Some(request.clone())));

    let service = manager(TestUnitOfWork::default().with_registrations(registrations));
    let result = service.approve(&primary_owner(), request_id).await;

    assert!(matches!(result, Err(AppError::InvalidTransition { .. })));
}

#[tokio::test]
async fn test_approve_requires_activation_flag() {
    let reader = SuperOwner::delegated(
        Uuid::new_v4(),
        DelegationLevel::ReadOnly,
        Some(SuperOwnerFlags::default()),
        Vec::new(),
        None,
    );

    let service = manager(TestUnitOfWork::default());
    let result = service.approve(&reader, Uuid::new_v4()).await;

    assert!(matches!(result, Err(AppError::PermissionDenied(_))));
}

#[tokio::test]
async fn test_reject_requires_reason_and_records_it() {
    let request = company_request();
    let request_id = request.id;

    let mut registrations = MockRegistrationRepository::new();
    registrations
        .expect_find_by_id()
        .returning(move |_| Ok(Some(request.clone())));
    registrations.expect_update().times(1).returning(Ok);

    let service = manager(TestUnitOfWork::default().with_registrations(registrations));
    let owner = primary_owner();

    let blank = service.reject(&owner, request_id, "   ".to_string()).await;
    assert!(matches!(blank, Err(AppError::Validation(_))));

    let rejected = service
        .reject(&owner, request_id, " Missing documents ".to_string())
        .await
        .expect("rejection succeeds");
    assert_eq!(rejected.status, RequestStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("Missing documents"));
}

#[tokio::test]
async fn test_bulk_reject_reports_each_request() {
    let open = company_request();
    let open_id = open.id;
    let missing_id = Uuid::new_v4();

    let mut registrations = MockRegistrationRepository::new();
    registrations
        .expect_find_by_id()
        .returning(move |id| Ok((id == open_id).then(|| open.clone())));
    registrations.expect_update().times(1).returning(Ok);

    let service = manager(TestUnitOfWork::default().with_registrations(registrations));
    let report = service
        .bulk_action(
            &primary_owner(),
            BulkActionRequest {
                ids: vec![open_id, missing_id, open_id],
                action: BulkAction::Reject,
                reason: Some("Duplicate application".to_string()),
            },
        )
        .await
        .expect("bulk action runs");

    assert_eq!(report.succeeded, vec![open_id]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].id, missing_id);
}

#[tokio::test]
async fn test_bulk_reject_without_reason_is_refused() {
    let service = manager(TestUnitOfWork::default());
    let result = service
        .bulk_action(
            &primary_owner(),
            BulkActionRequest {
                ids: vec![Uuid::new_v4()],
                action: BulkAction::Reject,
                reason: None,
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_expire_stale_updates_only_open_requests() {
    let mut registrations = MockRegistrationRepository::new();
    registrations
        .expect_list_expired_open()
        .returning(|_| Ok(vec![expired_request(), expired_request()]));
    registrations
        .expect_update()
        .times(2)
        .withf(|request| request.status == RequestStatus::Expired)
        .returning(Ok);

    let service = manager(TestUnitOfWork::default().with_registrations(registrations));
    assert_eq!(service.expire_stale().await.expect("expiry runs"), 2);
}

#[tokio::test]
async fn test_status_with_unknown_token_is_not_found() {
    let mut registrations = MockRegistrationRepository::new();
    registrations
        .expect_find_by_token()
        .returning(|_| Ok(None));

    let service = manager(TestUnitOfWork::default().with_registrations(registrations));
    let result = service.status("no-such-token").await;

    assert!(matches!(result, Err(AppError::NotFound)));
}

//! Company context, role and membership tests.

mod common;

use std::sync::Arc;

use construction_tracker::config::Config;
use construction_tracker::domain::{
    Action, Membership, MembershipStatus, Permission, Resource, Role, TenantContext,
};
use construction_tracker::errors::AppError;
use construction_tracker::infra::repositories::{
    MockAccessRepository, MockCompanyRepository, MockUserRepository,
};
use construction_tracker::services::{MemberUpdate, RoleInput, TenancyService, TenantManager};
use uuid::Uuid;

use common::{
    admin_tenant, company_roles, quiet_notifier, supervisor_tenant, tenant_with, user,
    TestUnitOfWork,
};

fn manager(uow: TestUnitOfWork) -> TenantManager<TestUnitOfWork> {
    TenantManager::new(Arc::new(uow), quiet_notifier(), Config::for_tests())
}

fn role_lookup(access: &mut MockAccessRepository, roles: Vec<Role>) {
    access
        .expect_find_role()
        .returning(move |_, id| Ok(roles.iter().find(|r| r.id == id).cloned()));
}

#[tokio::test]
async fn test_resolve_without_membership_is_no_company() {
    let mut access = MockAccessRepository::new();
    access.expect_memberships_for_user().returning(|_| Ok(vec![]));
    let mut users = MockUserRepository::new();
    users.expect_find_profile().returning(|_| Ok(None));

    let service = manager(TestUnitOfWork::default().with_access(access).with_users(users));
    let result = service.resolve(Uuid::new_v4()).await;

    assert!(matches!(result, Err(AppError::NoCompany)));
}

#[tokio::test]
async fn test_resolve_loads_company_and_role() {
    let ctx = admin_tenant();
    let membership = ctx.membership.clone();
    let company = ctx.company.clone();
    let role = ctx.role.clone();

    let mut access = MockAccessRepository::new();
    access
        .expect_memberships_for_user()
        .returning(move |_| Ok(vec![membership.clone()]));
    role_lookup(&mut access, vec![role]);
    let mut companies = MockCompanyRepository::new();
    companies
        .expect_find_by_id()
        .returning(move |_| Ok(Some(company.clone())));
    let mut users = MockUserRepository::new();
    users.expect_find_profile().returning(|_| Ok(None));

    let service = manager(
        TestUnitOfWork::default()
            .with_access(access)
            .with_companies(companies)
            .with_users(users),
    );
    let resolved = service.resolve(ctx.user_id).await.expect("context resolves");

    assert_eq!(resolved.company.id, ctx.company.id);
    assert_eq!(resolved.role.id, ctx.role.id);
    assert!(resolved.is_admin());
}

#[tokio::test]
async fn test_supervisor_cannot_create_roles() {
    let service = manager(TestUnitOfWork::default());
    let result = service
        .create_role(
            &supervisor_tenant(),
            RoleInput {
                name: "Site Engineer".to_string(),
                description: None,
                is_admin: false,
                is_supervisor: false,
                is_team_member: true,
                permissions: vec![],
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::PermissionDenied(_))));
}

#[tokio::test]
async fn test_duplicate_role_name_conflicts() {
    let mut access = MockAccessRepository::new();
    access.expect_role_name_taken().returning(|_, _, _| Ok(true));
    access.expect_create_role().never();

    let service = manager(TestUnitOfWork::default().with_access(access));
    let result = service
        .create_role(
            &admin_tenant(),
            RoleInput {
                name: " Supervisor ".to_string(),
                description: None,
                is_admin: false,
                is_supervisor: true,
                is_team_member: false,
                permissions: vec![],
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn test_last_admin_role_cannot_be_deleted() {
    let ctx = admin_tenant();
    let mut roles = company_roles(ctx.company.id);
    roles[0] = ctx.role.clone();
    let admin_id = ctx.role.id;

    let mut access = MockAccessRepository::new();
    role_lookup(&mut access, roles.clone());
    access.expect_count_role_members().returning(|_| Ok(0));
    access
        .expect_list_roles()
        .returning(move |_| Ok(roles.clone()));
    access.expect_delete_role().never();

    let service = manager(TestUnitOfWork::default().with_access(access));
    let result = service.delete_role(&ctx, admin_id).await;

    assert!(matches!(result, Err(AppError::Business(_))));
}

#[tokio::test]
async fn test_role_in_use_cannot_be_deleted() {
    let ctx = admin_tenant();
    let roles = company_roles(ctx.company.id);
    let employee_id = roles[2].id;

    let mut access = MockAccessRepository::new();
    role_lookup(&mut access, roles);
    access.expect_count_role_members().returning(|_| Ok(4));
    access.expect_delete_role().never();

    let service = manager(TestUnitOfWork::default().with_access(access));
    let result = service.delete_role(&ctx, employee_id).await;

    assert!(matches!(result, Err(AppError::Business(_))));
}

#[tokio::test]
async fn test_members_cannot_change_their_own_membership() {
    let ctx = admin_tenant();
    let own_id = ctx.membership.id;

    let service = manager(TestUnitOfWork::default());
    let result = service
        .update_member(
            &ctx,
            own_id,
            MemberUpdate {
                role_id: None,
                status: Some(MembershipStatus::Suspended),
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::Business(_))));
}

#[tokio::test]
async fn test_admin_can_demote_another_admin_while_one_remains() {
    let ctx = admin_tenant();
    let mut roles = company_roles(ctx.company.id);
    roles[0] = ctx.role.clone();
    let supervisor_id = roles[1].id;

    let colleague = user("co_admin", "hash", true);
    let target = Membership::new(colleague.id, ctx.company.id, ctx.role.id, Some(ctx.user_id));
    let target_id = target.id;
    let own = ctx.membership.clone();

    let mut access = MockAccessRepository::new();
    role_lookup(&mut access, roles.clone());
    let found = target.clone();
    access
        .expect_find_membership_by_id()
        .returning(move |_, _| Ok(Some(found.clone())));
    access
        .expect_list_roles()
        .returning(move |_| Ok(roles.clone()));
    access
        .expect_list_members()
        .returning(move |_| Ok(vec![own.clone(), target.clone()]));
    access
        .expect_update_membership()
        .times(1)
        .withf(move |m| m.role_id == supervisor_id)
        .returning(Ok);
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .returning(move |_| Ok(Some(colleague.clone())));

    let service = manager(TestUnitOfWork::default().with_access(access).with_users(users));
    let view = service
        .update_member(
            &ctx,
            target_id,
            MemberUpdate {
                role_id: Some(supervisor_id),
                status: None,
            },
        )
        .await
        .expect("demotion allowed");

    assert_eq!(view.membership.role_id, supervisor_id);
    assert_eq!(view.role_name, "Supervisor");
}

#[tokio::test]
async fn test_supervisor_cannot_update_members() {
    let service = manager(TestUnitOfWork::default());
    let result = service
        .update_member(&supervisor_tenant(), Uuid::new_v4(), MemberUpdate::default())
        .await;

    assert!(matches!(result, Err(AppError::PermissionDenied(_))));
}

/// Employee whose role was extended to manage roles
fn role_editor() -> TenantContext {
    let mut ctx = tenant_with(2);
    ctx.role
        .permissions
        .push(Permission::new(Resource::Users, Action::Edit));
    ctx
}

fn role_input(name: &str, permissions: Vec<Permission>) -> RoleInput {
    RoleInput {
        name: name.to_string(),
        description: None,
        is_admin: false,
        is_supervisor: false,
        is_team_member: true,
        permissions,
    }
}

#[tokio::test]
async fn test_non_admin_cannot_grant_permissions_they_lack() {
    let ctx = role_editor();
    let mut roles = company_roles(ctx.company.id);
    let target_id = roles[2].id;
    roles.push(ctx.role.clone());

    let mut access = MockAccessRepository::new();
    role_lookup(&mut access, roles);
    access.expect_update_role().never();

    let service = manager(TestUnitOfWork::default().with_access(access));
    let result = service
        .update_role(
            &ctx,
            target_id,
            role_input(
                "Employee",
                vec![Permission::new(Resource::Expenses, Action::Approve)],
            ),
        )
        .await;

    assert!(matches!(result, Err(AppError::PermissionDenied(_))));
}

#[tokio::test]
async fn test_non_admin_cannot_edit_their_own_role() {
    let ctx = role_editor();
    let own_role_id = ctx.role.id;

    let mut access = MockAccessRepository::new();
    role_lookup(&mut access, vec![ctx.role.clone()]);
    access.expect_update_role().never();

    let service = manager(TestUnitOfWork::default().with_access(access));
    let result = service
        .update_role(&ctx, own_role_id, role_input("Employee", vec![]))
        .await;

    assert!(matches!(result, Err(AppError::PermissionDenied(_))));
}

#[tokio::test]
async fn test_non_admin_may_grant_what_they_hold() {
    let ctx = role_editor();
    let roles = company_roles(ctx.company.id);
    let target = roles[2].clone();
    let target_id = target.id;
    let granted = Permission::new(Resource::Users, Action::Edit);

    let mut access = MockAccessRepository::new();
    role_lookup(&mut access, roles);
    access.expect_role_name_taken().returning(|_, _, _| Ok(false));
    access
        .expect_update_role()
        .times(1)
        .withf(move |r| r.permissions.contains(&granted))
        .returning(Ok);

    let mut permissions = target.permissions.clone();
    permissions.push(granted);

    let service = manager(TestUnitOfWork::default().with_access(access));
    let role = service
        .update_role(&ctx, target_id, role_input("Employee", permissions))
        .await
        .expect("grant allowed");

    assert!(role.permissions.contains(&granted));
}

#[tokio::test]
async fn test_non_admin_cannot_create_role_beyond_their_grants() {
    let mut access = MockAccessRepository::new();
    access.expect_create_role().never();

    let service = manager(TestUnitOfWork::default().with_access(access));
    let result = service
        .create_role(
            &role_editor(),
            role_input(
                "Approver",
                vec![Permission::new(Resource::Expenses, Action::Approve)],
            ),
        )
        .await;

    assert!(matches!(result, Err(AppError::PermissionDenied(_))));
}

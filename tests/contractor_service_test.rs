//! Contractor directory tests.

mod common;

use std::sync::Arc;

use mockall::predicate::eq;
use uuid::Uuid;
use validator::Validate;

use construction_tracker::domain::{Contractor, ContractorInput, ContractorType};
use construction_tracker::errors::AppError;
use construction_tracker::infra::repositories::MockContractorRepository;
use construction_tracker::services::{ContractorManager, ContractorService};

use common::{admin_tenant, supervisor_tenant, tenant_with, TestUnitOfWork};

fn manager(contractors: MockContractorRepository) -> ContractorManager<TestUnitOfWork> {
    ContractorManager::new(Arc::new(
        TestUnitOfWork::default().with_contractors(contractors),
    ))
}

fn input(name: &str, rating: Option<f64>) -> ContractorInput {
    ContractorInput {
        name: name.to_string(),
        contractor_type: Some(ContractorType::Electrical),
        contact_person: Some("Tunde".to_string()),
        email: Some("sparks@example.com".to_string()),
        phone: None,
        address: None,
        license_number: None,
        hourly_rate: Some(450_000),
        rating,
        is_active: None,
        notes: None,
    }
}

#[tokio::test]
async fn test_create_trims_name_and_checks_uniqueness() {
    let ctx = admin_tenant();
    let company_id = ctx.company.id;

    let mut contractors = MockContractorRepository::new();
    contractors
        .expect_name_taken()
        .times(1)
        .withf(move |company, name, exclude| {
            *company == company_id && name == "Bright Sparks" && exclude.is_none()
        })
        .returning(|_, _, _| Ok(false));
    contractors.expect_create().times(1).returning(Ok);

    let contractor = manager(contractors)
        .create(&ctx, input("  Bright Sparks ", Some(4.5)))
        .await
        .expect("contractor created");

    assert_eq!(contractor.name, "Bright Sparks");
    assert_eq!(contractor.company_id, company_id);
    assert_eq!(contractor.contractor_type, ContractorType::Electrical);
    assert!(contractor.is_active);
}

#[tokio::test]
async fn test_duplicate_name_is_a_conflict() {
    let mut contractors = MockContractorRepository::new();
    contractors
        .expect_name_taken()
        .returning(|_, _, _| Ok(true));
    contractors.expect_create().never();

    let result = manager(contractors)
        .create(&admin_tenant(), input("Bright Sparks", None))
        .await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn test_update_excludes_itself_from_the_name_check() {
    let ctx = admin_tenant();
    let existing = Contractor::new(ctx.company.id, input("Bright Sparks", Some(3.0)));
    let id = existing.id;

    let mut contractors = MockContractorRepository::new();
    contractors
        .expect_find()
        .with(eq(ctx.company.id), eq(id))
        .returning(move |_, _| Ok(Some(existing.clone())));
    contractors
        .expect_name_taken()
        .withf(move |_, _, exclude| *exclude == Some(id))
        .returning(|_, _, _| Ok(false));
    contractors.expect_update().times(1).returning(Ok);

    let contractor = manager(contractors)
        .update(&ctx, id, input("Bright Sparks", Some(4.0)))
        .await
        .expect("contractor updated");

    assert_eq!(contractor.rating, Some(4.0));
}

#[tokio::test]
async fn test_contractor_from_another_company_is_not_found() {
    let mut contractors = MockContractorRepository::new();
    contractors.expect_find().returning(|_, _| Ok(None));
    contractors.expect_delete().never();

    let result = manager(contractors)
        .delete(&admin_tenant(), Uuid::new_v4())
        .await;

    assert!(matches!(result, Err(AppError::NotFound)));
}

#[tokio::test]
async fn test_supervisor_cannot_add_contractors() {
    let mut contractors = MockContractorRepository::new();
    contractors.expect_name_taken().never();

    let result = manager(contractors)
        .create(&supervisor_tenant(), input("Bright Sparks", None))
        .await;

    assert!(matches!(result, Err(AppError::PermissionDenied(_))));
}

#[tokio::test]
async fn test_employee_cannot_delete_contractors() {
    let mut contractors = MockContractorRepository::new();
    contractors.expect_find().never();

    let result = manager(contractors)
        .delete(&tenant_with(2), Uuid::new_v4())
        .await;

    assert!(matches!(result, Err(AppError::PermissionDenied(_))));
}

#[test]
fn test_rating_outside_zero_to_five_is_invalid() {
    assert!(input("Bright Sparks", Some(5.0)).validate().is_ok());
    assert!(input("Bright Sparks", Some(5.5)).validate().is_err());
    assert!(input("Bright Sparks", Some(-1.0)).validate().is_err());
}

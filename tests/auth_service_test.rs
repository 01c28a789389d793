//! Login and session tests.

mod common;

use std::sync::Arc;

use construction_tracker::config::Config;
use construction_tracker::domain::{AccountType, Password, UserProfile};
use construction_tracker::errors::AppError;
use construction_tracker::infra::repositories::{MockSuperOwnerRepository, MockUserRepository};
use construction_tracker::infra::MockCacheStore;
use construction_tracker::services::{AuthService, Authenticator};

use common::{user, TestUnitOfWork};

const PASSWORD: &str = "correct-horse-battery";

fn hashed() -> String {
    Password::new(PASSWORD).expect("hashable").into_string()
}

fn authenticator(uow: TestUnitOfWork, cache: MockCacheStore) -> Authenticator<TestUnitOfWork> {
    Authenticator::new(Arc::new(uow), Arc::new(cache), Config::for_tests())
}

#[tokio::test]
async fn test_login_issues_token_for_active_account() {
    let account = user("site_lead", &hashed(), true);
    let user_id = account.id;
    let stored = account.clone();

    let mut users = MockUserRepository::new();
    users
        .expect_find_by_login()
        .returning(move |_| Ok(Some(account.clone())));
    users
        .expect_find_by_id()
        .returning(move |_| Ok(Some(stored.clone())));
    users.expect_find_profile().returning(move |id| {
        let mut profile = UserProfile::new(id, AccountType::Individual);
        profile.activate(None, chrono::Utc::now());
        Ok(Some(profile))
    });
    users.expect_record_login().times(1).returning(|_, _| Ok(()));

    let mut owners = MockSuperOwnerRepository::new();
    owners.expect_find_by_user().returning(|_| Ok(None));

    let mut cache = MockCacheStore::new();
    cache.expect_exists().returning(|_| Ok(false));

    let auth = authenticator(
        TestUnitOfWork::default()
            .with_users(users)
            .with_super_owners(owners),
        cache,
    );

    let token = auth
        .login("site_lead".to_string(), PASSWORD.to_string())
        .await
        .expect("login succeeds");
    assert_eq!(token.token_type, "Bearer");
    assert!(!token.is_super_owner);
    assert_eq!(token.user.id, user_id);

    let claims = auth
        .verify_token(&token.access_token)
        .await
        .expect("fresh token verifies");
    assert_eq!(claims.sub, user_id);
    assert_eq!(claims.username, "site_lead");
}

#[tokio::test]
async fn test_login_with_wrong_password_is_refused() {
    let account = user("site_lead", &hashed(), true);
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_login()
        .returning(move |_| Ok(Some(account.clone())));
    users.expect_record_login().never();

    let auth = authenticator(TestUnitOfWork::default().with_users(users), MockCacheStore::new());
    let result = auth
        .login("site_lead".to_string(), "not-the-password".to_string())
        .await;

    assert!(matches!(result, Err(AppError::InvalidCredentials)));
}

#[tokio::test]
async fn test_login_for_unknown_user_is_refused_the_same_way() {
    let mut users = MockUserRepository::new();
    users.expect_find_by_login().returning(|_| Ok(None));

    let auth = authenticator(TestUnitOfWork::default().with_users(users), MockCacheStore::new());
    let result = auth
        .login("ghost".to_string(), PASSWORD.to_string())
        .await;

    assert!(matches!(result, Err(AppError::InvalidCredentials)));
}

#[tokio::test]
async fn test_login_with_unactivated_profile_is_refused() {
    let account = user("applicant", &hashed(), true);
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_login()
        .returning(move |_| Ok(Some(account.clone())));
    users
        .expect_find_profile()
        .returning(|id| Ok(Some(UserProfile::new(id, AccountType::Individual))));
    users.expect_record_login().never();

    let auth = authenticator(TestUnitOfWork::default().with_users(users), MockCacheStore::new());
    let result = auth
        .login("applicant".to_string(), PASSWORD.to_string())
        .await;

    assert!(matches!(result, Err(AppError::AccountInactive)));
}

#[tokio::test]
async fn test_login_with_disabled_user_is_refused() {
    let account = user("former_staff", &hashed(), false);
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_login()
        .returning(move |_| Ok(Some(account.clone())));
    users.expect_find_profile().returning(|_| Ok(None));

    let auth = authenticator(TestUnitOfWork::default().with_users(users), MockCacheStore::new());
    let result = auth
        .login("former_staff".to_string(), PASSWORD.to_string())
        .await;

    assert!(matches!(result, Err(AppError::AccountInactive)));
}

#[tokio::test]
async fn test_revoked_token_is_rejected() {
    let account = user("site_lead", &hashed(), true);
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_login()
        .returning(move |_| Ok(Some(account.clone())));
    users.expect_find_profile().returning(|_| Ok(None));
    users.expect_record_login().returning(|_, _| Ok(()));
    let mut owners = MockSuperOwnerRepository::new();
    owners.expect_find_by_user().returning(|_| Ok(None));

    let mut cache = MockCacheStore::new();
    cache
        .expect_set()
        .times(1)
        .withf(|key, value, ttl| key.starts_with("revoked_token:") && value == "1" && *ttl > 0)
        .returning(|_, _, _| Ok(()));
    cache.expect_exists().returning(|_| Ok(true));

    let auth = authenticator(
        TestUnitOfWork::default()
            .with_users(users)
            .with_super_owners(owners),
        cache,
    );

    let token = auth
        .login("site_lead".to_string(), PASSWORD.to_string())
        .await
        .expect("login succeeds");
    let claims = jsonwebtoken::decode::<construction_tracker::services::Claims>(
        &token.access_token,
        &jsonwebtoken::DecodingKey::from_secret(Config::for_tests().jwt_secret_bytes()),
        &jsonwebtoken::Validation::default(),
    )
    .expect("token decodes")
    .claims;

    auth.logout(&claims).await.expect("logout succeeds");
    let result = auth.verify_token(&token.access_token).await;

    assert!(matches!(result, Err(AppError::Unauthorized)));
}

#[tokio::test]
async fn test_tampered_token_is_rejected() {
    let auth = authenticator(TestUnitOfWork::default(), MockCacheStore::new());
    let result = auth.verify_token("not.a.jwt").await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_token_of_deactivated_account_is_rejected() {
    let account = user("site_lead", &hashed(), true);
    let mut deactivated = account.clone();
    deactivated.is_active = false;

    let mut users = MockUserRepository::new();
    users
        .expect_find_by_login()
        .returning(move |_| Ok(Some(account.clone())));
    users.expect_find_profile().returning(|_| Ok(None));
    users.expect_record_login().returning(|_, _| Ok(()));
    users
        .expect_find_by_id()
        .returning(move |_| Ok(Some(deactivated.clone())));
    let mut owners = MockSuperOwnerRepository::new();
    owners.expect_find_by_user().returning(|_| Ok(None));

    let mut cache = MockCacheStore::new();
    cache.expect_exists().returning(|_| Ok(false));

    let auth = authenticator(
        TestUnitOfWork::default()
            .with_users(users)
            .with_super_owners(owners),
        cache,
    );
    let token = auth
        .login("site_lead".to_string(), PASSWORD.to_string())
        .await
        .expect("login succeeds while active");

    let result = auth.verify_token(&token.access_token).await;
    assert!(matches!(result, Err(AppError::Unauthorized)));
}

#[tokio::test]
async fn test_token_of_deleted_account_is_rejected() {
    let account = user("site_lead", &hashed(), true);

    let mut users = MockUserRepository::new();
    users
        .expect_find_by_login()
        .returning(move |_| Ok(Some(account.clone())));
    users.expect_find_profile().returning(|_| Ok(None));
    users.expect_record_login().returning(|_, _| Ok(()));
    users.expect_find_by_id().returning(|_| Ok(None));
    let mut owners = MockSuperOwnerRepository::new();
    owners.expect_find_by_user().returning(|_| Ok(None));

    let mut cache = MockCacheStore::new();
    cache.expect_exists().returning(|_| Ok(false));

    let auth = authenticator(
        TestUnitOfWork::default()
            .with_users(users)
            .with_super_owners(owners),
        cache,
    );
    let token = auth
        .login("site_lead".to_string(), PASSWORD.to_string())
        .await
        .expect("login succeeds");

    let result = auth.verify_token(&token.access_token).await;
    assert!(matches!(result, Err(AppError::Unauthorized)));
}

//! Migration: users, profiles and super owners.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Users::Username).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::FirstName).string().not_null().default(""))
                    .col(ColumnDef::new(Users::LastName).string().not_null().default(""))
                    .col(ColumnDef::new(Users::IsActive).boolean().not_null().default(false))
                    .col(ColumnDef::new(Users::IsStaff).boolean().not_null().default(false))
                    .col(ColumnDef::new(Users::LastLoginAt).timestamp_with_time_zone().null())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserProfiles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UserProfiles::UserId).uuid().not_null().primary_key())
                    .col(ColumnDef::new(UserProfiles::Phone).string().null())
                    .col(ColumnDef::new(UserProfiles::Address).text().null())
                    .col(ColumnDef::new(UserProfiles::AccountType).string().not_null())
                    .col(ColumnDef::new(UserProfiles::IsVerified).boolean().not_null().default(false))
                    .col(
                        ColumnDef::new(UserProfiles::IsAccountActive)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(UserProfiles::ActivatedBy).uuid().null())
                    .col(ColumnDef::new(UserProfiles::ActivatedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(UserProfiles::LastCompanyId).uuid().null())
                    .col(
                        ColumnDef::new(UserProfiles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(UserProfiles::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_profiles_user")
                            .from(UserProfiles::Table, UserProfiles::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SuperOwners::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(SuperOwners::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(SuperOwners::UserId).uuid().not_null().unique_key())
                    .col(
                        ColumnDef::new(SuperOwners::IsPrimaryOwner)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(SuperOwners::DelegationLevel)
                            .string()
                            .not_null()
                            .default("read_only"),
                    )
                    .col(flag(SuperOwners::CanManageCompanies))
                    .col(flag(SuperOwners::CanManageUsers))
                    .col(flag(SuperOwners::CanActivateAccounts))
                    .col(flag(SuperOwners::CanAccessAdmin))
                    .col(flag(SuperOwners::CanDelegatePermissions))
                    .col(flag(SuperOwners::CanManageBilling))
                    .col(flag(SuperOwners::CanViewSystemAnalytics))
                    .col(
                        ColumnDef::new(SuperOwners::AllowedCompanyIds)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(ColumnDef::new(SuperOwners::CreatedBy).uuid().null())
                    .col(
                        ColumnDef::new(SuperOwners::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(SuperOwners::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_super_owners_user")
                            .from(SuperOwners::Table, SuperOwners::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one primary owner
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_super_owners_single_primary \
                 ON super_owners (is_primary_owner) WHERE is_primary_owner",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SuperOwners::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserProfiles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

fn flag(column: SuperOwners) -> ColumnDef {
    ColumnDef::new(column).boolean().not_null().default(false).to_owned()
}

#[derive(Iden)]
pub enum Users {
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    FirstName,
    LastName,
    IsActive,
    IsStaff,
    LastLoginAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum UserProfiles {
    Table,
    UserId,
    Phone,
    Address,
    AccountType,
    IsVerified,
    IsAccountActive,
    ActivatedBy,
    ActivatedAt,
    LastCompanyId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum SuperOwners {
    Table,
    Id,
    UserId,
    IsPrimaryOwner,
    DelegationLevel,
    CanManageCompanies,
    CanManageUsers,
    CanActivateAccounts,
    CanAccessAdmin,
    CanDelegatePermissions,
    CanManageBilling,
    CanViewSystemAnalytics,
    AllowedCompanyIds,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

//! Migration: companies, roles and memberships.

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_accounts::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Companies::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Companies::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Companies::Name).string().not_null())
                    .col(ColumnDef::new(Companies::Slug).string().not_null().unique_key())
                    .col(ColumnDef::new(Companies::Description).text().null())
                    .col(ColumnDef::new(Companies::Email).string().null())
                    .col(ColumnDef::new(Companies::Phone).string().null())
                    .col(ColumnDef::new(Companies::Address).text().null())
                    .col(ColumnDef::new(Companies::Website).string().null())
                    .col(ColumnDef::new(Companies::RegistrationNumber).string().null())
                    .col(
                        ColumnDef::new(Companies::SubscriptionType)
                            .string()
                            .not_null()
                            .default("trial"),
                    )
                    .col(
                        ColumnDef::new(Companies::SubscriptionEndDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Companies::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(Companies::Timezone).string().not_null().default("UTC"))
                    .col(ColumnDef::new(Companies::Currency).string().not_null().default("NGN"))
                    .col(
                        ColumnDef::new(Companies::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Companies::UpdatedAt)
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
                    .table(Roles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Roles::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Roles::CompanyId).uuid().not_null())
                    .col(ColumnDef::new(Roles::Name).string().not_null())
                    .col(ColumnDef::new(Roles::Description).text().null())
                    .col(ColumnDef::new(Roles::IsAdmin).boolean().not_null().default(false))
                    .col(ColumnDef::new(Roles::IsSupervisor).boolean().not_null().default(false))
                    .col(ColumnDef::new(Roles::IsTeamMember).boolean().not_null().default(false))
                    .col(
                        ColumnDef::new(Roles::Permissions)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(Roles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Roles::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_roles_company")
                            .from(Roles::Table, Roles::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_roles_company_name")
                    .table(Roles::Table)
                    .col(Roles::CompanyId)
                    .col(Roles::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CompanyMemberships::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CompanyMemberships::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(CompanyMemberships::UserId).uuid().not_null())
                    .col(ColumnDef::new(CompanyMemberships::CompanyId).uuid().not_null())
                    .col(ColumnDef::new(CompanyMemberships::RoleId).uuid().not_null())
                    .col(
                        ColumnDef::new(CompanyMemberships::Status)
                            .string()
                            .not_null()
                            .default("active"),
                    )
                    .col(ColumnDef::new(CompanyMemberships::InvitedBy).uuid().null())
                    .col(
                        ColumnDef::new(CompanyMemberships::JoinedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(CompanyMemberships::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(CompanyMemberships::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_memberships_user")
                            .from(CompanyMemberships::Table, CompanyMemberships::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_memberships_company")
                            .from(CompanyMemberships::Table, CompanyMemberships::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_memberships_role")
                            .from(CompanyMemberships::Table, CompanyMemberships::RoleId)
                            .to(Roles::Table, Roles::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_memberships_user_company")
                    .table(CompanyMemberships::Table)
                    .col(CompanyMemberships::UserId)
                    .col(CompanyMemberships::CompanyId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CompanyMemberships::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Roles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Companies::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Companies {
    Table,
    Id,
    Name,
    Slug,
    Description,
    Email,
    Phone,
    Address,
    Website,
    RegistrationNumber,
    SubscriptionType,
    SubscriptionEndDate,
    IsActive,
    Timezone,
    Currency,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Roles {
    Table,
    Id,
    CompanyId,
    Name,
    Description,
    IsAdmin,
    IsSupervisor,
    IsTeamMember,
    Permissions,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum CompanyMemberships {
    Table,
    Id,
    UserId,
    CompanyId,
    RoleId,
    Status,
    InvitedBy,
    JoinedAt,
    CreatedAt,
    UpdatedAt,
}

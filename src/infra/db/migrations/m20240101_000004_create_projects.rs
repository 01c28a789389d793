//! Migration: contractors, projects, assignments, expense categories and expenses.

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_accounts::Users;
use super::m20240101_000002_create_companies::Companies;

#[derive(DeriveMigrationName)]
pub struct Migration;

fn timestamp<T: IntoIden>(column: T) -> ColumnDef {
    ColumnDef::new(column)
        .timestamp_with_time_zone()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

fn company_fk<T: IntoTableRef, C: IntoIden>(
    name: &str,
    table: T,
    column: C,
) -> ForeignKeyCreateStatement {
    ForeignKey::create()
        .name(name)
        .from(table, column)
        .to(Companies::Table, Companies::Id)
        .on_delete(ForeignKeyAction::Cascade)
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Contractors::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Contractors::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Contractors::CompanyId).uuid().not_null())
                    .col(ColumnDef::new(Contractors::Name).string().not_null())
                    .col(
                        ColumnDef::new(Contractors::ContractorType)
                            .string()
                            .not_null()
                            .default("general"),
                    )
                    .col(ColumnDef::new(Contractors::ContactPerson).string().null())
                    .col(ColumnDef::new(Contractors::Email).string().null())
                    .col(ColumnDef::new(Contractors::Phone).string().null())
                    .col(ColumnDef::new(Contractors::Address).text().null())
                    .col(ColumnDef::new(Contractors::LicenseNumber).string().null())
                    .col(ColumnDef::new(Contractors::HourlyRate).big_integer().null())
                    .col(ColumnDef::new(Contractors::Rating).double().null())
                    .col(ColumnDef::new(Contractors::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(Contractors::Notes).text().null())
                    .col(timestamp(Contractors::CreatedAt))
                    .col(timestamp(Contractors::UpdatedAt))
                    .foreign_key(&mut company_fk(
                        "fk_contractors_company",
                        Contractors::Table,
                        Contractors::CompanyId,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_contractors_company_name")
                    .table(Contractors::Table)
                    .col(Contractors::CompanyId)
                    .col(Contractors::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Projects::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Projects::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Projects::CompanyId).uuid().not_null())
                    .col(ColumnDef::new(Projects::CreatedBy).uuid().not_null())
                    .col(ColumnDef::new(Projects::Name).string().not_null())
                    .col(ColumnDef::new(Projects::Description).text().null())
                    .col(ColumnDef::new(Projects::Location).string().null())
                    .col(ColumnDef::new(Projects::Status).string().not_null().default("planning"))
                    .col(ColumnDef::new(Projects::Priority).string().not_null().default("medium"))
                    .col(ColumnDef::new(Projects::StartDate).date().null())
                    .col(ColumnDef::new(Projects::EndDate).date().null())
                    .col(ColumnDef::new(Projects::ExpectedCompletionDate).date().null())
                    .col(ColumnDef::new(Projects::TotalBudget).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Projects::ClientName).string().null())
                    .col(ColumnDef::new(Projects::ClientEmail).string().null())
                    .col(ColumnDef::new(Projects::ClientPhone).string().null())
                    .col(
                        ColumnDef::new(Projects::ProgressPercentage)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(timestamp(Projects::CreatedAt))
                    .col(timestamp(Projects::UpdatedAt))
                    .foreign_key(&mut company_fk(
                        "fk_projects_company",
                        Projects::Table,
                        Projects::CompanyId,
                    ))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_projects_created_by")
                            .from(Projects::Table, Projects::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_projects_company_name")
                    .table(Projects::Table)
                    .col(Projects::CompanyId)
                    .col(Projects::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProjectContractors::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ProjectContractors::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ProjectContractors::ProjectId).uuid().not_null())
                    .col(ColumnDef::new(ProjectContractors::ContractorId).uuid().not_null())
                    .col(ColumnDef::new(ProjectContractors::Role).string().not_null())
                    .col(ColumnDef::new(ProjectContractors::StartDate).date().null())
                    .col(ColumnDef::new(ProjectContractors::EndDate).date().null())
                    .col(ColumnDef::new(ProjectContractors::HourlyRate).big_integer().null())
                    .col(
                        ColumnDef::new(ProjectContractors::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(timestamp(ProjectContractors::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_contractors_project")
                            .from(ProjectContractors::Table, ProjectContractors::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_contractors_contractor")
                            .from(ProjectContractors::Table, ProjectContractors::ContractorId)
                            .to(Contractors::Table, Contractors::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_project_contractors_unique_role")
                    .table(ProjectContractors::Table)
                    .col(ProjectContractors::ProjectId)
                    .col(ProjectContractors::ContractorId)
                    .col(ProjectContractors::Role)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ExpenseCategories::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ExpenseCategories::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ExpenseCategories::CompanyId).uuid().not_null())
                    .col(ColumnDef::new(ExpenseCategories::Name).string().not_null())
                    .col(ColumnDef::new(ExpenseCategories::Description).text().null())
                    .col(
                        ColumnDef::new(ExpenseCategories::Color)
                            .string_len(7)
                            .not_null()
                            .default("#007bff"),
                    )
                    .col(
                        ColumnDef::new(ExpenseCategories::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(timestamp(ExpenseCategories::CreatedAt))
                    .foreign_key(&mut company_fk(
                        "fk_expense_categories_company",
                        ExpenseCategories::Table,
                        ExpenseCategories::CompanyId,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_expense_categories_company_name")
                    .table(ExpenseCategories::Table)
                    .col(ExpenseCategories::CompanyId)
                    .col(ExpenseCategories::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Expenses::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Expenses::ProjectId).uuid().not_null())
                    .col(ColumnDef::new(Expenses::CompanyId).uuid().not_null())
                    .col(ColumnDef::new(Expenses::CategoryId).uuid().null())
                    .col(ColumnDef::new(Expenses::ContractorId).uuid().null())
                    .col(ColumnDef::new(Expenses::CreatedBy).uuid().not_null())
                    .col(ColumnDef::new(Expenses::ApprovedBy).uuid().null())
                    .col(ColumnDef::new(Expenses::Name).string().not_null())
                    .col(ColumnDef::new(Expenses::Description).text().null())
                    .col(ColumnDef::new(Expenses::ExpenseType).string().not_null().default("other"))
                    .col(ColumnDef::new(Expenses::Status).string().not_null().default("planned"))
                    .col(ColumnDef::new(Expenses::PlannedCost).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Expenses::ActualCost).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Expenses::ExpenseDate).date().not_null())
                    .col(ColumnDef::new(Expenses::DueDate).date().null())
                    .col(ColumnDef::new(Expenses::PaidDate).date().null())
                    .col(ColumnDef::new(Expenses::Quantity).double().not_null().default(1.0))
                    .col(ColumnDef::new(Expenses::Unit).string().null())
                    .col(ColumnDef::new(Expenses::UnitCost).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Expenses::InvoiceNumber).string().null())
                    .col(ColumnDef::new(Expenses::Vendor).string().null())
                    .col(ColumnDef::new(Expenses::Notes).text().null())
                    .col(ColumnDef::new(Expenses::TaxAmount).big_integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Expenses::IsTaxDeductible)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(timestamp(Expenses::CreatedAt))
                    .col(timestamp(Expenses::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expenses_project")
                            .from(Expenses::Table, Expenses::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(&mut company_fk(
                        "fk_expenses_company",
                        Expenses::Table,
                        Expenses::CompanyId,
                    ))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expenses_category")
                            .from(Expenses::Table, Expenses::CategoryId)
                            .to(ExpenseCategories::Table, ExpenseCategories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expenses_contractor")
                            .from(Expenses::Table, Expenses::ContractorId)
                            .to(Contractors::Table, Contractors::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_expenses_company_date")
                    .table(Expenses::Table)
                    .col(Expenses::CompanyId)
                    .col(Expenses::ExpenseDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_expenses_project")
                    .table(Expenses::Table)
                    .col(Expenses::ProjectId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ExpenseCategories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProjectContractors::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Projects::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Contractors::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Contractors {
    Table,
    Id,
    CompanyId,
    Name,
    ContractorType,
    ContactPerson,
    Email,
    Phone,
    Address,
    LicenseNumber,
    HourlyRate,
    Rating,
    IsActive,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Projects {
    Table,
    Id,
    CompanyId,
    CreatedBy,
    Name,
    Description,
    Location,
    Status,
    Priority,
    StartDate,
    EndDate,
    ExpectedCompletionDate,
    TotalBudget,
    ClientName,
    ClientEmail,
    ClientPhone,
    ProgressPercentage,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ProjectContractors {
    Table,
    Id,
    ProjectId,
    ContractorId,
    Role,
    StartDate,
    EndDate,
    HourlyRate,
    IsActive,
    CreatedAt,
}

#[derive(Iden)]
enum ExpenseCategories {
    Table,
    Id,
    CompanyId,
    Name,
    Description,
    Color,
    IsActive,
    CreatedAt,
}

#[derive(Iden)]
enum Expenses {
    Table,
    Id,
    ProjectId,
    CompanyId,
    CategoryId,
    ContractorId,
    CreatedBy,
    ApprovedBy,
    Name,
    Description,
    ExpenseType,
    Status,
    PlannedCost,
    ActualCost,
    ExpenseDate,
    DueDate,
    PaidDate,
    Quantity,
    Unit,
    UnitCost,
    InvoiceNumber,
    Vendor,
    Notes,
    TaxAmount,
    IsTaxDeductible,
    CreatedAt,
    UpdatedAt,
}

//! Migration: registration requests and their documents.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RegistrationRequests::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RegistrationRequests::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(RegistrationRequests::RequestType).string().not_null())
                    .col(
                        ColumnDef::new(RegistrationRequests::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(RegistrationRequests::Email).string().not_null())
                    .col(ColumnDef::new(RegistrationRequests::Username).string().not_null())
                    .col(ColumnDef::new(RegistrationRequests::FirstName).string().not_null())
                    .col(ColumnDef::new(RegistrationRequests::LastName).string().not_null())
                    .col(ColumnDef::new(RegistrationRequests::Phone).string().null())
                    .col(ColumnDef::new(RegistrationRequests::CompanyName).string().null())
                    .col(ColumnDef::new(RegistrationRequests::CompanyDescription).text().null())
                    .col(ColumnDef::new(RegistrationRequests::CompanyWebsite).string().null())
                    .col(ColumnDef::new(RegistrationRequests::CompanyAddress).text().null())
                    .col(
                        ColumnDef::new(RegistrationRequests::CompanyRegistrationNumber)
                            .string()
                            .null(),
                    )
                    .col(ColumnDef::new(RegistrationRequests::ReviewedBy).uuid().null())
                    .col(
                        ColumnDef::new(RegistrationRequests::ReviewedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(RegistrationRequests::RejectionReason).text().null())
                    .col(
                        ColumnDef::new(RegistrationRequests::ActivationToken)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(RegistrationRequests::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RegistrationRequests::Metadata)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'{}'::jsonb")),
                    )
                    .col(ColumnDef::new(RegistrationRequests::ProvisionedUserId).uuid().null())
                    .col(
                        ColumnDef::new(RegistrationRequests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(RegistrationRequests::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_registration_requests_status")
                    .table(RegistrationRequests::Table)
                    .col(RegistrationRequests::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_registration_requests_email")
                    .table(RegistrationRequests::Table)
                    .col(RegistrationRequests::Email)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RegistrationDocuments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RegistrationDocuments::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(RegistrationDocuments::RequestId).uuid().not_null())
                    .col(ColumnDef::new(RegistrationDocuments::DocumentType).string().not_null())
                    .col(ColumnDef::new(RegistrationDocuments::StorageKey).string().not_null())
                    .col(ColumnDef::new(RegistrationDocuments::OriginalFilename).string().not_null())
                    .col(ColumnDef::new(RegistrationDocuments::ContentType).string().not_null())
                    .col(ColumnDef::new(RegistrationDocuments::FileSize).big_integer().not_null())
                    .col(ColumnDef::new(RegistrationDocuments::Description).text().null())
                    .col(
                        ColumnDef::new(RegistrationDocuments::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(RegistrationDocuments::ReviewedBy).uuid().null())
                    .col(
                        ColumnDef::new(RegistrationDocuments::ReviewedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(RegistrationDocuments::ReviewNotes).text().null())
                    .col(
                        ColumnDef::new(RegistrationDocuments::UploadedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_documents_request")
                            .from(RegistrationDocuments::Table, RegistrationDocuments::RequestId)
                            .to(RegistrationRequests::Table, RegistrationRequests::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_registration_documents_request")
                    .table(RegistrationDocuments::Table)
                    .col(RegistrationDocuments::RequestId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RegistrationDocuments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RegistrationRequests::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum RegistrationRequests {
    Table,
    Id,
    RequestType,
    Status,
    Email,
    Username,
    FirstName,
    LastName,
    Phone,
    CompanyName,
    CompanyDescription,
    CompanyWebsite,
    CompanyAddress,
    CompanyRegistrationNumber,
    ReviewedBy,
    ReviewedAt,
    RejectionReason,
    ActivationToken,
    ExpiresAt,
    Metadata,
    ProvisionedUserId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum RegistrationDocuments {
    Table,
    Id,
    RequestId,
    DocumentType,
    StorageKey,
    OriginalFilename,
    ContentType,
    FileSize,
    Description,
    Status,
    ReviewedBy,
    ReviewedAt,
    ReviewNotes,
    UploadedAt,
}

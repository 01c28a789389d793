//! Pagination types for list endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::config::{DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::domain::{
    Company, Contractor, Notification, Project, RegistrationRequest, UserResponse,
};
use crate::services::ExpenseView;

/// Pagination query parameters shared by every list endpoint
#[derive(Debug, Clone, PartialEq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// 1-based page number
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

fn default_page() -> u64 {
    DEFAULT_PAGE_NUMBER
}

fn default_per_page() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl PaginationParams {
    pub fn new(page: u64, per_page: u64) -> Self {
        Self { page, per_page }
    }

    /// Page number, never below 1
    pub fn page(&self) -> u64 {
        self.page.max(1)
    }

    /// Calculate offset for database query
    pub fn offset(&self) -> u64 {
        (self.page() - 1) * self.limit()
    }

    /// Get limit capped at maximum
    pub fn limit(&self) -> u64 {
        self.per_page.clamp(1, MAX_PAGE_SIZE)
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE_NUMBER,
            per_page: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Paginated response wrapper
#[derive(Debug, Serialize, ToSchema)]
#[aliases(
    RegistrationPage = Paginated<RegistrationRequest>,
    CompanyPage = Paginated<Company>,
    UserPage = Paginated<UserResponse>,
    ProjectPage = Paginated<Project>,
    ExpensePage = Paginated<ExpenseView>,
    ContractorPage = Paginated<Contractor>,
    NotificationPage = Paginated<Notification>
)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PaginationMeta {
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> Paginated<T> {
    /// Create new paginated response
    pub fn new(data: Vec<T>, page: u64, per_page: u64, total: u64) -> Self {
        let total_pages = if per_page > 0 {
            (total + per_page - 1) / per_page
        } else {
            0
        };

        Self {
            data,
            meta: PaginationMeta {
                page,
                per_page,
                total,
                total_pages,
            },
        }
    }

    /// Wrap a `(rows, total)` page fetched with `params`.
    pub fn from_page(page: (Vec<T>, u64), params: &PaginationParams) -> Self {
        Self::new(page.0, params.page(), params.limit(), page.1)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}

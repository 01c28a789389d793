//! Query-string filters for list endpoints.

use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::domain::{ExpenseStatus, ProjectStatus, RequestStatus, RequestType};

/// Free-text search
#[derive(Debug, Clone, Default, PartialEq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchFilter {
    pub search: Option<String>,
}

/// Registration request listing filter
#[derive(Debug, Clone, Default, PartialEq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RequestFilter {
    pub status: Option<RequestStatus>,
    pub request_type: Option<RequestType>,
    /// Matches email, username, names and company name
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProjectFilter {
    pub status: Option<ProjectStatus>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExpenseFilter {
    pub project_id: Option<Uuid>,
    pub status: Option<ExpenseStatus>,
    pub category_id: Option<Uuid>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NotificationFilter {
    /// Only notifications not yet read
    #[serde(default)]
    pub unread_only: bool,
}

/// Trimmed, non-empty search term
pub fn search_term(search: &Option<String>) -> Option<&str> {
    search.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

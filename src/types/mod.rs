//! Shared request/response types.

mod filters;
mod pagination;
mod response;

pub use filters::{
    search_term, ExpenseFilter, NotificationFilter, ProjectFilter, RequestFilter, SearchFilter,
};
pub use pagination::{
    CompanyPage, ContractorPage, ExpensePage, NotificationPage, Paginated, PaginationMeta,
    PaginationParams, ProjectPage, RegistrationPage, UserPage,
};
pub use response::MessageResponse;

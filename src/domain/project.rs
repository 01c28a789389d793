//! Construction projects and contractor assignments.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::expense::{sum_amounts, Expense};
use crate::errors::{AppError, AppResult};

string_enum!(
    ProjectStatus {
        Planning => "planning",
        InProgress => "in_progress",
        OnHold => "on_hold",
        Completed => "completed",
        Cancelled => "cancelled",
    }
);

impl ProjectStatus {
    /// Planning and in-progress projects count as active
    pub fn is_active(&self) -> bool {
        matches!(self, ProjectStatus::Planning | ProjectStatus::InProgress)
    }
}

string_enum!(
    Priority {
        Medium => "medium",
        Low => "low",
        High => "high",
        Urgent => "urgent",
    }
);

/// Project domain entity
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Project {
    pub id: Uuid,
    pub company_id: Uuid,
    pub created_by: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub status: ProjectStatus,
    pub priority: Priority,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub expected_completion_date: Option<NaiveDate>,
    /// Budget in minor currency units
    pub total_budget: i64,
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub progress_percentage: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(company_id: Uuid, created_by: Uuid, input: ProjectInput) -> AppResult<Self> {
        input.check_dates()?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            company_id,
            created_by,
            name: input.name.trim().to_string(),
            description: input.description,
            location: input.location,
            status: input.status.unwrap_or_default(),
            priority: input.priority.unwrap_or_default(),
            start_date: input.start_date,
            end_date: input.end_date,
            expected_completion_date: input.expected_completion_date,
            total_budget: input.total_budget,
            client_name: input.client_name,
            client_email: input.client_email,
            client_phone: input.client_phone,
            progress_percentage: input.progress_percentage.unwrap_or(0),
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace editable fields with the given input.
    pub fn apply(&mut self, input: ProjectInput) -> AppResult<()> {
        input.check_dates()?;
        self.name = input.name.trim().to_string();
        self.description = input.description;
        self.location = input.location;
        if let Some(status) = input.status {
            self.status = status;
        }
        if let Some(priority) = input.priority {
            self.priority = priority;
        }
        self.start_date = input.start_date;
        self.end_date = input.end_date;
        self.expected_completion_date = input.expected_completion_date;
        self.total_budget = input.total_budget;
        self.client_name = input.client_name;
        self.client_email = input.client_email;
        self.client_phone = input.client_phone;
        if let Some(progress) = input.progress_percentage {
            self.progress_percentage = progress;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Days until the expected completion date (negative when past)
    pub fn days_remaining(&self, today: NaiveDate) -> Option<i64> {
        self.expected_completion_date
            .map(|date| (date - today).num_days())
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != ProjectStatus::Completed
            && self.expected_completion_date.map_or(false, |date| today > date)
    }
}

/// Create/update payload for projects
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ProjectInput {
    #[validate(length(min = 1, max = 200, message = "Project name is required (max 200 characters)"))]
    #[schema(example = "Lekki Duplex")]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(max = 300, message = "Location is too long"))]
    pub location: Option<String>,
    pub status: Option<ProjectStatus>,
    pub priority: Option<Priority>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub expected_completion_date: Option<NaiveDate>,
    #[validate(range(min = 0i64, max = 1_000_000_000_000_000i64, message = "Budget is out of range"))]
    #[serde(default)]
    #[schema(example = 5000000)]
    pub total_budget: i64,
    pub client_name: Option<String>,
    #[validate(email(message = "Invalid client email"))]
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    #[validate(range(min = 0, max = 100, message = "Progress must be between 0 and 100"))]
    pub progress_percentage: Option<i32>,
}

impl ProjectInput {
    fn check_dates(&self) -> AppResult<()> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(AppError::validation("End date cannot be before start date"));
            }
        }
        Ok(())
    }
}

/// Budget figures for one project or a whole company
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProjectFinancials {
    pub total_budget: i64,
    pub total_expenses: i64,
    pub total_planned_expenses: i64,
    /// Budget minus actual expenses
    pub budget_variance: i64,
    pub is_over_budget: bool,
    /// Percentage of the budget spent, one decimal
    pub budget_utilization: f64,
}

impl ProjectFinancials {
    pub fn compute(total_budget: i64, expenses: &[Expense]) -> Self {
        let total_expenses = sum_amounts(expenses.iter().map(|e| e.actual_cost));
        let total_planned_expenses = sum_amounts(expenses.iter().map(|e| e.planned_cost));
        Self {
            total_budget,
            total_expenses,
            total_planned_expenses,
            budget_variance: total_budget.saturating_sub(total_expenses),
            is_over_budget: total_expenses > total_budget,
            budget_utilization: utilization(total_budget, total_expenses),
        }
    }
}

/// Share of `budget` consumed by `spent`, in percent with one decimal.
pub fn utilization(budget: i64, spent: i64) -> f64 {
    if budget <= 0 {
        return 0.0;
    }
    (spent as f64 / budget as f64 * 1000.0).round() / 10.0
}

/// Contractor assigned to a project
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContractorAssignment {
    pub id: Uuid,
    pub project_id: Uuid,
    pub contractor_id: Uuid,
    pub role: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub hourly_rate: Option<i64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl ContractorAssignment {
    pub fn new(project_id: Uuid, input: AssignmentInput) -> AppResult<Self> {
        if let (Some(start), Some(end)) = (input.start_date, input.end_date) {
            if end < start {
                return Err(AppError::validation("End date cannot be before start date"));
            }
        }
        Ok(Self {
            id: Uuid::new_v4(),
            project_id,
            contractor_id: input.contractor_id,
            role: input.role.trim().to_string(),
            start_date: input.start_date,
            end_date: input.end_date,
            hourly_rate: input.hourly_rate,
            is_active: true,
            created_at: Utc::now(),
        })
    }
}

/// Payload for assigning a contractor to a project
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AssignmentInput {
    pub contractor_id: Uuid,
    #[validate(length(min = 1, max = 100, message = "Role is required (max 100 characters)"))]
    #[schema(example = "Electrical works")]
    pub role: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Minor currency units
    #[validate(range(min = 0i64, max = 1_000_000_000_000_000i64, message = "Hourly rate is out of range"))]
    pub hourly_rate: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> ProjectInput {
        ProjectInput {
            name: " Bridge ".to_string(),
            description: None,
            location: None,
            status: None,
            priority: None,
            start_date: None,
            end_date: None,
            expected_completion_date: None,
            total_budget: 100_000,
            client_name: None,
            client_email: None,
            client_phone: None,
            progress_percentage: None,
        }
    }

    #[test]
    fn test_new_project_defaults() {
        let project = Project::new(Uuid::new_v4(), Uuid::new_v4(), input()).unwrap();
        assert_eq!(project.name, "Bridge");
        assert_eq!(project.status, ProjectStatus::Planning);
        assert_eq!(project.priority, Priority::Medium);
        assert_eq!(project.progress_percentage, 0);
    }

    #[test]
    fn test_rejects_inverted_dates() {
        let mut bad = input();
        bad.start_date = NaiveDate::from_ymd_opt(2024, 5, 1);
        bad.end_date = NaiveDate::from_ymd_opt(2024, 4, 1);
        assert!(Project::new(Uuid::new_v4(), Uuid::new_v4(), bad).is_err());
    }

    #[test]
    fn test_overdue_and_days_remaining() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let mut project = Project::new(Uuid::new_v4(), Uuid::new_v4(), input()).unwrap();
        assert!(!project.is_overdue(today));
        assert_eq!(project.days_remaining(today), None);

        project.expected_completion_date = NaiveDate::from_ymd_opt(2024, 6, 10);
        assert!(project.is_overdue(today));
        assert_eq!(project.days_remaining(today), Some(-5));

        project.status = ProjectStatus::Completed;
        assert!(!project.is_overdue(today));
    }

    #[test]
    fn test_utilization_rounding() {
        assert_eq!(utilization(0, 500), 0.0);
        assert_eq!(utilization(300, 100), 33.3);
        assert_eq!(utilization(1000, 1500), 150.0);
        assert_eq!(utilization(3, 2), 66.7);
    }
}

//! In-app notifications and per-user delivery preferences.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::project::utilization;
use crate::config::BUDGET_ALERT_PERCENT;

string_enum!(
    NotificationKind {
        ExpenseCreated => "expense_created",
        ExpenseApproved => "expense_approved",
        BudgetWarning => "budget_warning",
        RoleChanged => "role_changed",
        UserInvited => "user_invited",
    }
);

string_enum!(
    NotificationPriority {
        Medium => "medium",
        Low => "low",
        High => "high",
        Urgent => "urgent",
    }
);

impl NotificationKind {
    /// Email copy is opt-in except for budget alerts
    pub fn emails_by_default(&self) -> bool {
        matches!(self, NotificationKind::BudgetWarning)
    }

    pub fn priority(&self) -> NotificationPriority {
        match self {
            NotificationKind::BudgetWarning => NotificationPriority::High,
            _ => NotificationPriority::Medium,
        }
    }
}

/// Who in a company receives a broadcast notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Active members holding a supervisor role
    Supervisors,
    /// Active members holding a supervisor or admin role
    Managers,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    pub id: Uuid,
    pub company_id: Uuid,
    pub recipient_id: Uuid,
    pub sender_id: Option<Uuid>,
    pub kind: NotificationKind,
    pub priority: NotificationPriority,
    pub title: String,
    pub message: String,
    /// Expense, project or membership the notification is about
    pub object_id: Option<Uuid>,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        company_id: Uuid,
        recipient_id: Uuid,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            company_id,
            recipient_id,
            sender_id: None,
            kind,
            priority: kind.priority(),
            title: title.into(),
            message: message.into(),
            object_id: None,
            read_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn from_sender(mut self, sender_id: Uuid) -> Self {
        self.sender_id = Some(sender_id);
        self
    }

    pub fn about(mut self, object_id: Uuid) -> Self {
        self.object_id = Some(object_id);
        self
    }

    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }

    /// Returns false when it was already read; the first read time is kept.
    pub fn mark_read(&mut self, at: DateTime<Utc>) -> bool {
        if self.read_at.is_some() {
            return false;
        }
        self.read_at = Some(at);
        true
    }
}

/// One user's delivery choice for one kind of notification in one company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NotificationPreference {
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub kind: NotificationKind,
    pub in_app_enabled: bool,
    pub email_enabled: bool,
    pub updated_at: DateTime<Utc>,
}

impl NotificationPreference {
    pub fn default_for(user_id: Uuid, company_id: Uuid, kind: NotificationKind) -> Self {
        Self {
            user_id,
            company_id,
            kind,
            in_app_enabled: true,
            email_enabled: kind.emails_by_default(),
            updated_at: Utc::now(),
        }
    }

    /// The stored preference for `kind`, or the default when none was saved
    pub fn resolve(
        stored: &[NotificationPreference],
        user_id: Uuid,
        company_id: Uuid,
        kind: NotificationKind,
    ) -> Self {
        stored
            .iter()
            .find(|p| p.user_id == user_id && p.kind == kind)
            .cloned()
            .unwrap_or_else(|| Self::default_for(user_id, company_id, kind))
    }
}

/// Change to one preference; omitted channels keep their value
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PreferenceUpdate {
    pub kind: NotificationKind,
    pub in_app_enabled: Option<bool>,
    pub email_enabled: Option<bool>,
}

impl NotificationPreference {
    pub fn apply(&mut self, update: &PreferenceUpdate) {
        if let Some(in_app) = update.in_app_enabled {
            self.in_app_enabled = in_app;
        }
        if let Some(email) = update.email_enabled {
            self.email_enabled = email;
        }
        self.updated_at = Utc::now();
    }
}

/// Whether spending moved from at or below the alert line to above it.
pub fn crosses_budget_alert(budget: i64, spent_before: i64, spent_after: i64) -> bool {
    if budget <= 0 {
        return false;
    }
    utilization(budget, spent_before) <= BUDGET_ALERT_PERCENT
        && utilization(budget, spent_after) > BUDGET_ALERT_PERCENT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_read_keeps_first_time() {
        let mut n = Notification::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            NotificationKind::RoleChanged,
            "Your role has been updated",
            "Supervisor to Employee",
        );
        assert!(!n.is_read());

        let first = Utc::now();
        assert!(n.mark_read(first));
        assert!(!n.mark_read(first + chrono::Duration::minutes(5)));
        assert_eq!(n.read_at, Some(first));
    }

    #[test]
    fn test_budget_alert_fires_once_when_crossing() {
        assert!(crosses_budget_alert(1_000, 800, 950));
        assert!(crosses_budget_alert(1_000, 900, 901));
        assert!(!crosses_budget_alert(1_000, 950, 990));
        assert!(!crosses_budget_alert(1_000, 100, 900));
        assert!(!crosses_budget_alert(0, 0, 500));
    }

    #[test]
    fn test_preferences_fall_back_to_defaults() {
        let user = Uuid::new_v4();
        let company = Uuid::new_v4();
        let mut stored = NotificationPreference::default_for(user, company, NotificationKind::ExpenseCreated);
        stored.apply(&PreferenceUpdate {
            kind: NotificationKind::ExpenseCreated,
            in_app_enabled: Some(false),
            email_enabled: None,
        });

        let resolved =
            NotificationPreference::resolve(&[stored], user, company, NotificationKind::ExpenseCreated);
        assert!(!resolved.in_app_enabled);
        assert!(!resolved.email_enabled);

        let budget =
            NotificationPreference::resolve(&[], user, company, NotificationKind::BudgetWarning);
        assert!(budget.in_app_enabled);
        assert!(budget.email_enabled);
        assert_eq!(NotificationKind::BudgetWarning.priority(), NotificationPriority::High);
    }
}

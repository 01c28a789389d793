//! In-app notifications - the user's inbox and the events that fill it.
//!
//! Services raise events through [`NotificationCenter`]; raising one never
//! fails the operation that triggered it. Each recipient's preference
//! decides whether the notification is stored, emailed, or both.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use super::notifications::{messages, Notifier};
use crate::config::MAX_PREFERENCE_UPDATES;
use crate::domain::{
    crosses_budget_alert, project::utilization, sum_amounts, Audience, Expense, Membership,
    Notification, NotificationKind, NotificationPreference, PreferenceUpdate, Project, Role,
    TenantContext,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;
use crate::types::{NotificationFilter, Paginated, PaginationParams};

/// Amount in minor units as `NGN 1250.00`
fn money(currency: &str, minor: i64) -> String {
    format!("{} {}.{:02}", currency, minor / 100, (minor % 100).abs())
}

#[async_trait]
pub trait NotificationService: Send + Sync {
    /// The caller's notifications in the current company
    async fn list(
        &self,
        ctx: &TenantContext,
        filter: NotificationFilter,
        params: PaginationParams,
    ) -> AppResult<Paginated<Notification>>;

    async fn unread_count(&self, ctx: &TenantContext) -> AppResult<u64>;

    /// Mark one of the caller's notifications as read
    async fn mark_read(&self, ctx: &TenantContext, id: Uuid) -> AppResult<Notification>;

    /// Returns how many notifications changed
    async fn mark_all_read(&self, ctx: &TenantContext) -> AppResult<u64>;

    /// One preference per kind, defaults filled in
    async fn preferences(&self, ctx: &TenantContext) -> AppResult<Vec<NotificationPreference>>;

    async fn update_preferences(
        &self,
        ctx: &TenantContext,
        updates: Vec<PreferenceUpdate>,
    ) -> AppResult<Vec<NotificationPreference>>;
}

pub struct NotificationCenter<U: UnitOfWork> {
    uow: Arc<U>,
    notifier: Notifier,
}

impl<U: UnitOfWork> NotificationCenter<U> {
    pub fn new(uow: Arc<U>, notifier: Notifier) -> Self {
        Self { uow, notifier }
    }

    /// Store and email `batch` according to each recipient's preference.
    async fn dispatch(&self, ctx: &TenantContext, kind: NotificationKind, batch: Vec<Notification>) {
        if batch.is_empty() {
            return;
        }
        if let Err(e) = self.try_dispatch(ctx, kind, batch).await {
            tracing::warn!(
                company_id = %ctx.company_id(),
                kind = %kind,
                error = %e,
                "Failed to deliver notifications"
            );
        }
    }

    async fn try_dispatch(
        &self,
        ctx: &TenantContext,
        kind: NotificationKind,
        batch: Vec<Notification>,
    ) -> AppResult<()> {
        let company_id = ctx.company_id();
        let recipients: Vec<Uuid> = batch.iter().map(|n| n.recipient_id).collect();
        let stored = self
            .uow
            .notifications()
            .preferences(company_id, recipients, Some(kind))
            .await?;
        let preference =
            |user_id: Uuid| NotificationPreference::resolve(&stored, user_id, company_id, kind);

        let email_to: Vec<Uuid> = batch
            .iter()
            .filter(|n| preference(n.recipient_id).email_enabled)
            .map(|n| n.recipient_id)
            .collect();
        let in_app: Vec<Notification> = batch
            .iter()
            .filter(|n| preference(n.recipient_id).in_app_enabled)
            .cloned()
            .collect();

        let written = self.uow.notifications().create_many(in_app).await?;
        tracing::debug!(company_id = %company_id, kind = %kind, written, "Notifications stored");

        if !email_to.is_empty() {
            let users = self.uow.users().find_by_ids(email_to).await?;
            let emails = batch
                .iter()
                .filter_map(|n| {
                    users
                        .iter()
                        .find(|u| u.id == n.recipient_id)
                        .map(|u| messages::notification_copy(&ctx.company.name, n, &u.email))
                })
                .collect();
            self.notifier.deliver_all(emails).await;
        }
        Ok(())
    }

    /// Active members of `audience`, minus the acting user
    async fn audience(&self, ctx: &TenantContext, audience: Audience, skip_actor: bool) -> Vec<Uuid> {
        match self
            .uow
            .notifications()
            .recipients(ctx.company_id(), audience)
            .await
        {
            Ok(mut ids) => {
                ids.sort_unstable();
                ids.dedup();
                if skip_actor {
                    ids.retain(|id| *id != ctx.user_id);
                }
                ids
            }
            Err(e) => {
                tracing::warn!(company_id = %ctx.company_id(), error = %e, "Failed to resolve recipients");
                Vec::new()
            }
        }
    }

    /// Tell the company's supervisors about a new expense
    pub async fn expense_created(&self, ctx: &TenantContext, expense: &Expense, project: &Project) {
        let title = format!("New Expense Created: {}", expense.name);
        let message = format!(
            "A new expense \"{}\" was added to project \"{}\" worth {}.",
            expense.name,
            project.name,
            money(&ctx.company.currency, expense.actual_cost),
        );
        let batch = self
            .audience(ctx, Audience::Supervisors, true)
            .await
            .into_iter()
            .map(|recipient| {
                Notification::new(
                    ctx.company_id(),
                    recipient,
                    NotificationKind::ExpenseCreated,
                    title.clone(),
                    message.clone(),
                )
                .from_sender(ctx.user_id)
                .about(expense.id)
            })
            .collect();
        self.dispatch(ctx, NotificationKind::ExpenseCreated, batch).await;
    }

    /// Tell the expense's author it was approved, unless they approved it
    pub async fn expense_approved(&self, ctx: &TenantContext, expense: &Expense) {
        if expense.created_by == ctx.user_id {
            return;
        }
        let notification = Notification::new(
            ctx.company_id(),
            expense.created_by,
            NotificationKind::ExpenseApproved,
            format!("Expense Approved: {}", expense.name),
            format!("Your expense \"{}\" has been approved.", expense.name),
        )
        .from_sender(ctx.user_id)
        .about(expense.id);
        self.dispatch(ctx, NotificationKind::ExpenseApproved, vec![notification])
            .await;
    }

    /// Alert supervisors and admins when actual spending on `project` rose
    /// by `increase` and crossed the alert line.
    pub async fn spending_increased(&self, ctx: &TenantContext, project: &Project, increase: i64) {
        if increase <= 0 || project.total_budget <= 0 {
            return;
        }
        let expenses = match self.uow.expenses().list_for_project(project.id).await {
            Ok(expenses) => expenses,
            Err(e) => {
                tracing::warn!(project_id = %project.id, error = %e, "Budget check skipped");
                return;
            }
        };
        let spent = sum_amounts(expenses.iter().map(|e| e.actual_cost));
        if !crosses_budget_alert(project.total_budget, spent.saturating_sub(increase), spent) {
            return;
        }

        let currency = &ctx.company.currency;
        let title = format!("Budget Warning: {}", project.name);
        let message = format!(
            "Project '{}' has used {:.1}% of its budget. Current spending: {}, Budget: {}",
            project.name,
            utilization(project.total_budget, spent),
            money(currency, spent),
            money(currency, project.total_budget),
        );
        tracing::info!(project_id = %project.id, spent, budget = project.total_budget, "Budget alert raised");

        let batch = self
            .audience(ctx, Audience::Managers, false)
            .await
            .into_iter()
            .map(|recipient| {
                Notification::new(
                    ctx.company_id(),
                    recipient,
                    NotificationKind::BudgetWarning,
                    title.clone(),
                    message.clone(),
                )
                .about(project.id)
            })
            .collect();
        self.dispatch(ctx, NotificationKind::BudgetWarning, batch).await;
    }

    pub async fn role_changed(
        &self,
        ctx: &TenantContext,
        membership: &Membership,
        old_role: &Role,
        new_role: &Role,
    ) {
        let notification = Notification::new(
            ctx.company_id(),
            membership.user_id,
            NotificationKind::RoleChanged,
            "Your Role Has Been Updated",
            format!(
                "Your role in {} has been changed from {} to {}.",
                ctx.company.name, old_role.name, new_role.name
            ),
        )
        .from_sender(ctx.user_id)
        .about(membership.id);
        self.dispatch(ctx, NotificationKind::RoleChanged, vec![notification])
            .await;
    }

    pub async fn member_invited(&self, ctx: &TenantContext, membership: &Membership, role: &Role) {
        let notification = Notification::new(
            ctx.company_id(),
            membership.user_id,
            NotificationKind::UserInvited,
            format!("Welcome to {}", ctx.company.name),
            format!(
                "You have been invited to join {} with the role of {}.",
                ctx.company.name, role.name
            ),
        )
        .from_sender(ctx.user_id)
        .about(membership.id);
        self.dispatch(ctx, NotificationKind::UserInvited, vec![notification])
            .await;
    }
}

#[async_trait]
impl<U: UnitOfWork> NotificationService for NotificationCenter<U> {
    async fn list(
        &self,
        ctx: &TenantContext,
        filter: NotificationFilter,
        params: PaginationParams,
    ) -> AppResult<Paginated<Notification>> {
        let page = self
            .uow
            .notifications()
            .list(ctx.user_id, ctx.company_id(), filter.unread_only, &params)
            .await?;
        Ok(Paginated::from_page(page, &params))
    }

    async fn unread_count(&self, ctx: &TenantContext) -> AppResult<u64> {
        self.uow
            .notifications()
            .count_unread(ctx.user_id, ctx.company_id())
            .await
    }

    async fn mark_read(&self, ctx: &TenantContext, id: Uuid) -> AppResult<Notification> {
        let repo = self.uow.notifications();
        let mut notification = repo
            .find(ctx.user_id, id)
            .await?
            .filter(|n| n.company_id == ctx.company_id())
            .ok_or_not_found()?;

        if notification.mark_read(Utc::now()) {
            notification = repo.update(notification).await?;
        }
        Ok(notification)
    }

    async fn mark_all_read(&self, ctx: &TenantContext) -> AppResult<u64> {
        let count = self
            .uow
            .notifications()
            .mark_all_read(ctx.user_id, ctx.company_id(), Utc::now())
            .await?;
        tracing::debug!(user_id = %ctx.user_id, count, "Notifications marked read");
        Ok(count)
    }

    async fn preferences(&self, ctx: &TenantContext) -> AppResult<Vec<NotificationPreference>> {
        let stored = self
            .uow
            .notifications()
            .preferences(ctx.company_id(), vec![ctx.user_id], None)
            .await?;
        Ok(NotificationKind::ALL
            .iter()
            .map(|kind| NotificationPreference::resolve(&stored, ctx.user_id, ctx.company_id(), *kind))
            .collect())
    }

    async fn update_preferences(
        &self,
        ctx: &TenantContext,
        updates: Vec<PreferenceUpdate>,
    ) -> AppResult<Vec<NotificationPreference>> {
        if updates.is_empty() || updates.len() > MAX_PREFERENCE_UPDATES {
            return Err(AppError::validation(format!(
                "Send between 1 and {} preference updates",
                MAX_PREFERENCE_UPDATES
            )));
        }

        let repo = self.uow.notifications();
        let stored = repo
            .preferences(ctx.company_id(), vec![ctx.user_id], None)
            .await?;
        let mut saved = Vec::with_capacity(updates.len());
        for update in &updates {
            let mut preference =
                NotificationPreference::resolve(&stored, ctx.user_id, ctx.company_id(), update.kind);
            preference.apply(update);
            saved.push(repo.save_preference(preference).await?);
        }

        tracing::info!(user_id = %ctx.user_id, count = saved.len(), "Notification preferences updated");
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_formats_minor_units() {
        assert_eq!(money("NGN", 125_050), "NGN 1250.50");
        assert_eq!(money("USD", 7), "USD 0.07");
    }
}

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{ActivityStore, Database, MetricsStore, Transaction, UserStore};
use crate::errors::AppError;
use crate::models::{activity::Activity, health_metrics::HealthMetrics, user::User};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    activities: HashMap<Uuid, Activity>,
    metrics: HashMap<Uuid, HealthMetrics>,
}

impl MemoryState {
    fn ensure_owner(&self, user_id: Uuid) -> Result<(), AppError> {
        if self.users.contains_key(&user_id) {
            Ok(())
        } else {
            Err(AppError::not_found("Referenced user not found"))
        }
    }
}

/// Process-local store. One lock covers the whole state, so transactions run
/// one at a time. Writers work on their own copy until commit; readers look
/// at the locked state directly.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    async fn open(&self, read_only: bool) -> MemoryTransaction {
        let guard = self.state.clone().lock_owned().await;
        let working = if read_only { None } else { Some(guard.clone()) };
        MemoryTransaction { guard, working }
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn begin(&self) -> Result<Box<dyn Transaction>, AppError> {
        Ok(Box::new(self.open(false).await))
    }

    async fn begin_read_only(&self) -> Result<Box<dyn Transaction>, AppError> {
        Ok(Box::new(self.open(true).await))
    }
}

pub struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    /// `None` for read-only transactions.
    working: Option<MemoryState>,
}

impl MemoryTransaction {
    fn state(&self) -> &MemoryState {
        self.working.as_ref().unwrap_or(&*self.guard)
    }

    fn state_mut(&mut self) -> Result<&mut MemoryState, AppError> {
        self.working.as_mut().ok_or_else(|| {
            AppError::InternalServerError("Write attempted in a read-only transaction".to_string())
        })
    }
}

#[async_trait]
impl UserStore for MemoryTransaction {
    async fn find_user(&mut self, user_id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.state().users.get(&user_id).cloned())
    }

    async fn find_all_users(&mut self) -> Result<Vec<User>, AppError> {
        let mut users: Vec<User> = self.state().users.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.user_id.cmp(&b.user_id)));
        Ok(users)
    }

    async fn user_exists(&mut self, user_id: Uuid) -> Result<bool, AppError> {
        Ok(self.state().users.contains_key(&user_id))
    }

    async fn email_exists(&mut self, email: &str) -> Result<bool, AppError> {
        Ok(self.state().users.values().any(|u| u.email == email))
    }

    async fn save_user(&mut self, mut user: User) -> Result<User, AppError> {
        let state = self.state_mut()?;
        let clash = state
            .users
            .values()
            .any(|u| u.email == user.email && u.user_id != user.user_id);
        if clash {
            return Err(AppError::invalid(format!(
                "User with email {} already exists",
                user.email
            )));
        }
        let now = Utc::now();
        match state.users.get(&user.user_id) {
            Some(existing) => user.created_at = existing.created_at,
            None => user.created_at = now,
        }
        user.updated_at = now;
        state.users.insert(user.user_id, user.clone());
        Ok(user)
    }

    async fn delete_user(&mut self, user_id: Uuid) -> Result<(), AppError> {
        let state = self.state_mut()?;
        state.users.remove(&user_id);
        state.activities.retain(|_, a| a.user_id != user_id);
        state.metrics.retain(|_, m| m.user_id != user_id);
        Ok(())
    }
}

#[async_trait]
impl MetricsStore for MemoryTransaction {
    async fn find_metrics(
        &mut self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<HealthMetrics>, AppError> {
        Ok(self
            .state()
            .metrics
            .values()
            .find(|m| m.user_id == user_id && m.date == date)
            .cloned())
    }

    async fn find_metrics_range(
        &mut self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<HealthMetrics>, AppError> {
        let mut rows: Vec<HealthMetrics> = self
            .state()
            .metrics
            .values()
            .filter(|m| m.user_id == user_id && m.date >= from && m.date <= to)
            .cloned()
            .collect();
        rows.sort_by_key(|m| m.date);
        Ok(rows)
    }

    async fn save_metrics(&mut self, mut metrics: HealthMetrics) -> Result<HealthMetrics, AppError> {
        let state = self.state_mut()?;
        state.ensure_owner(metrics.user_id)?;
        let duplicate = state.metrics.values().any(|m| {
            m.user_id == metrics.user_id
                && m.date == metrics.date
                && m.metrics_id != metrics.metrics_id
        });
        if duplicate {
            return Err(AppError::invalid(format!(
                "Metrics for {} already exist",
                metrics.date
            )));
        }
        let now = Utc::now();
        match state.metrics.get(&metrics.metrics_id) {
            Some(existing) => metrics.created_at = existing.created_at,
            None => metrics.created_at = now,
        }
        metrics.updated_at = now;
        state.metrics.insert(metrics.metrics_id, metrics.clone());
        Ok(metrics)
    }
}

#[async_trait]
impl ActivityStore for MemoryTransaction {
    async fn find_activity(&mut self, activity_id: Uuid) -> Result<Option<Activity>, AppError> {
        Ok(self.state().activities.get(&activity_id).cloned())
    }

    async fn find_activities_by_user(&mut self, user_id: Uuid) -> Result<Vec<Activity>, AppError> {
        let mut activities: Vec<Activity> = self
            .state()
            .activities
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        activities.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(activities)
    }

    async fn find_activities_between(
        &mut self,
        user_id: Uuid,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Activity>, AppError> {
        let mut activities: Vec<Activity> = self
            .state()
            .activities
            .values()
            .filter(|a| a.user_id == user_id && a.start_time >= from && a.start_time <= to)
            .cloned()
            .collect();
        activities.sort_by_key(|a| a.start_time);
        Ok(activities)
    }

    async fn save_activity(&mut self, mut activity: Activity) -> Result<Activity, AppError> {
        let state = self.state_mut()?;
        state.ensure_owner(activity.user_id)?;
        let now = Utc::now();
        match state.activities.get(&activity.activity_id) {
            Some(existing) => activity.created_at = existing.created_at,
            None => activity.created_at = now,
        }
        activity.updated_at = now;
        state.activities.insert(activity.activity_id, activity.clone());
        Ok(activity)
    }

    async fn delete_activity(&mut self, activity_id: Uuid) -> Result<(), AppError> {
        self.state_mut()?.activities.remove(&activity_id);
        Ok(())
    }

    async fn activity_exists(&mut self, activity_id: Uuid) -> Result<bool, AppError> {
        Ok(self.state().activities.contains_key(&activity_id))
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let MemoryTransaction { mut guard, working } = *self;
        if let Some(working) = working {
            *guard = working;
        }
        Ok(())
    }
}

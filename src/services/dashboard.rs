use chrono::{Duration, NaiveDate};
use log::debug;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use super::calculator::BmrAnalyzer;
use super::require_user;
use crate::db::Database;
use crate::errors::AppError;
use crate::models::health_metrics::HealthMetrics;
use crate::utils::clock::LocalClock;

const DAYS_PER_WEEK: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyStats {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_steps: i64,
    pub total_calories_burned: f64,
    pub total_calories_consumed: f64,
    pub net_calories: f64,
    pub total_distance_km: f64,
    pub total_active_minutes: i64,
    pub average_steps_per_day: f64,
    pub average_active_minutes_per_day: f64,
}

impl WeeklyStats {
    fn from_rows(start_date: NaiveDate, end_date: NaiveDate, rows: &[HealthMetrics]) -> Self {
        let total_steps: i64 = rows.iter().filter_map(|m| m.steps).map(i64::from).sum();
        let total_calories_burned: f64 = rows.iter().filter_map(|m| m.calories_burned).sum();
        let total_calories_consumed: f64 = rows.iter().filter_map(|m| m.calories_consumed).sum();
        let total_distance_km: f64 = rows.iter().filter_map(|m| m.distance_km).sum();
        let total_active_minutes: i64 = rows.iter().filter_map(|m| m.active_minutes).map(i64::from).sum();

        // Averages are over a full week even when some days have no row.
        let days = DAYS_PER_WEEK as f64;
        WeeklyStats {
            start_date,
            end_date,
            total_steps,
            total_calories_burned,
            total_calories_consumed,
            net_calories: total_calories_consumed - total_calories_burned,
            total_distance_km,
            total_active_minutes,
            average_steps_per_day: total_steps as f64 / days,
            average_active_minutes_per_day: total_active_minutes as f64 / days,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSummary {
    pub user_id: Uuid,
    pub name: String,
    pub age: Option<i32>,
    pub bmi: f64,
    pub bmr: f64,
    pub tdee: f64,
}

#[derive(Clone)]
pub struct DashboardService {
    db: Arc<dyn Database>,
    bmr: Arc<dyn BmrAnalyzer>,
    clock: LocalClock,
}

impl DashboardService {
    pub fn new(db: Arc<dyn Database>, bmr: Arc<dyn BmrAnalyzer>, clock: LocalClock) -> Self {
        DashboardService { db, bmr, clock }
    }

    /// Totals from `week_start` through `week_start + 7` inclusive. Without a
    /// start date the window opens a week before today.
    pub async fn weekly_stats(
        &self,
        user_id: Uuid,
        week_start: Option<NaiveDate>,
    ) -> Result<WeeklyStats, AppError> {
        let week = Duration::days(DAYS_PER_WEEK);
        let out_of_range = || AppError::invalid("Week start date is out of range");
        let start = match week_start {
            Some(start) => start,
            None => self.clock.today().checked_sub_signed(week).ok_or_else(out_of_range)?,
        };
        let end = start.checked_add_signed(week).ok_or_else(out_of_range)?;

        let mut tx = self.db.begin_read_only().await?;
        require_user(&mut *tx, user_id).await?;
        let rows = tx.find_metrics_range(user_id, start, end).await?;
        tx.commit().await?;

        debug!("Weekly stats for user {} over {} rows", user_id, rows.len());
        Ok(WeeklyStats::from_rows(start, end, &rows))
    }

    pub async fn health_summary(&self, user_id: Uuid) -> Result<HealthSummary, AppError> {
        let mut tx = self.db.begin_read_only().await?;
        let user = require_user(&mut *tx, user_id).await?;
        tx.commit().await?;

        let today = self.clock.today();
        Ok(HealthSummary {
            user_id: user.user_id,
            name: user.name.clone(),
            age: user.age_on(today),
            bmi: user.bmi(),
            bmr: self.bmr.bmr(&user, today)?,
            tdee: self.bmr.tdee(&user, today)?,
        })
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::models::activity::Activity;

/// Average stride length expressed as steps per kilometre.
pub const STEPS_PER_KM: f64 = 1300.0;

/// The single aggregate row for one user on one calendar day.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct HealthMetrics {
    pub metrics_id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub steps: Option<i32>,
    pub calories_consumed: Option<f64>,
    pub calories_burned: Option<f64>,
    pub distance_km: Option<f64>,
    pub active_minutes: Option<i32>,
    pub water_intake_liters: Option<f64>,
    pub sleep_hours: Option<f64>,
    pub heart_rate_avg: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Self-reported values for a day; only present fields overwrite the stored row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsPatch {
    pub steps: Option<i32>,
    pub calories_consumed: Option<f64>,
    pub calories_burned: Option<f64>,
    pub distance_km: Option<f64>,
    pub active_minutes: Option<i32>,
    pub water_intake_liters: Option<f64>,
    pub sleep_hours: Option<f64>,
    pub heart_rate_avg: Option<i32>,
}

impl HealthMetrics {
    /// A fresh row for (user, date) with every counter at zero.
    pub fn open(user_id: Uuid, date: NaiveDate) -> Self {
        let now = Utc::now();
        HealthMetrics {
            metrics_id: Uuid::new_v4(),
            user_id,
            date,
            steps: Some(0),
            calories_consumed: Some(0.0),
            calories_burned: Some(0.0),
            distance_km: Some(0.0),
            active_minutes: Some(0),
            water_intake_liters: Some(0.0),
            sleep_hours: Some(0.0),
            heart_rate_avg: Some(0),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn net_calories(&self) -> f64 {
        self.calories_consumed.unwrap_or(0.0) - self.calories_burned.unwrap_or(0.0)
    }

    /// Books an activity against this day. Steps, intake, sleep, water and heart
    /// rate are left alone.
    pub fn apply_activity(&mut self, activity: &Activity) {
        self.calories_burned = Some(self.calories_burned.unwrap_or(0.0) + activity.calories_burned);
        self.active_minutes = Some(
            self.active_minutes
                .unwrap_or(0)
                .saturating_add(activity.duration_minutes),
        );
        if let Some(distance) = activity.distance_km {
            self.distance_km = Some(self.distance_km.unwrap_or(0.0) + distance);
        }
    }

    /// Accumulates steps and the distance they imply. Not idempotent.
    pub fn add_steps(&mut self, steps: i32) {
        self.steps = Some(self.steps.unwrap_or(0).saturating_add(steps));
        self.distance_km = Some(self.distance_km.unwrap_or(0.0) + f64::from(steps) / STEPS_PER_KM);
    }

    pub fn apply_patch(&mut self, patch: &MetricsPatch) {
        if let Some(steps) = patch.steps {
            self.steps = Some(steps);
        }
        if let Some(consumed) = patch.calories_consumed {
            self.calories_consumed = Some(consumed);
        }
        if let Some(burned) = patch.calories_burned {
            self.calories_burned = Some(burned);
        }
        if let Some(distance) = patch.distance_km {
            self.distance_km = Some(distance);
        }
        if let Some(minutes) = patch.active_minutes {
            self.active_minutes = Some(minutes);
        }
        if let Some(water) = patch.water_intake_liters {
            self.water_intake_liters = Some(water);
        }
        if let Some(sleep) = patch.sleep_hours {
            self.sleep_hours = Some(sleep);
        }
        if let Some(heart_rate) = patch.heart_rate_avg {
            self.heart_rate_avg = Some(heart_rate);
        }
    }
}

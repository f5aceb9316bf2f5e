//! Activity intake: every recorded activity is priced in calories and booked
//! against the owner's daily aggregate in the same transaction.

use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info};
use std::sync::Arc;
use uuid::Uuid;

use super::calculator::CalorieCalculator;
use super::metrics::open_daily_metrics;
use super::require_user;
use crate::db::{Database, Transaction};
use crate::errors::AppError;
use crate::models::activity::{Activity, ActivityPatch};
use crate::utils::datetime::{end_of_day, start_of_day};

#[derive(Debug, Clone, PartialEq)]
pub struct NewActivity {
    pub activity_type: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub distance_km: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Clone)]
pub struct ActivityService {
    db: Arc<dyn Database>,
    calories: Arc<dyn CalorieCalculator>,
}

async fn owned_activity(
    tx: &mut dyn Transaction,
    user_id: Uuid,
    activity_id: Uuid,
) -> Result<Activity, AppError> {
    tx.find_activity(activity_id)
        .await?
        .filter(|activity| activity.user_id == user_id)
        .ok_or_else(|| AppError::not_found(format!("Activity not found with id: {}", activity_id)))
}

impl ActivityService {
    pub fn new(db: Arc<dyn Database>, calories: Arc<dyn CalorieCalculator>) -> Self {
        ActivityService { db, calories }
    }

    fn price(&self, activity: &mut Activity, weight_kg: Option<f64>) {
        activity.calories_burned = self.calories.calories_burned(
            &activity.activity_type,
            f64::from(activity.duration_minutes),
            weight_kg.unwrap_or(0.0),
        );
    }

    /// Persists the activity and adds its calories, minutes and distance to the
    /// aggregate for its start date. Both writes commit together or not at all.
    pub async fn record_activity(&self, user_id: Uuid, new: NewActivity) -> Result<Activity, AppError> {
        let mut tx = self.db.begin().await?;
        let user = require_user(&mut *tx, user_id).await?;

        let mut activity = Activity::new(user_id, new.activity_type, new.start_time, new.end_time);
        activity.distance_km = new.distance_km;
        activity.notes = new.notes;
        self.price(&mut activity, user.weight_kg);
        let activity = tx.save_activity(activity).await?;

        let date = activity.activity_date();
        let mut metrics = open_daily_metrics(&mut *tx, user_id, date).await?;
        metrics.apply_activity(&activity);
        tx.save_metrics(metrics).await?;
        tx.commit().await?;

        info!(
            "Recorded {} for user {} on {}: {} min, {:.2} kcal",
            activity.activity_type, user_id, date, activity.duration_minutes, activity.calories_burned
        );
        Ok(activity)
    }

    pub async fn get_activity(&self, user_id: Uuid, activity_id: Uuid) -> Result<Activity, AppError> {
        let mut tx = self.db.begin_read_only().await?;
        let activity = owned_activity(&mut *tx, user_id, activity_id).await?;
        tx.commit().await?;
        Ok(activity)
    }

    /// Newest first.
    pub async fn list_activities(&self, user_id: Uuid) -> Result<Vec<Activity>, AppError> {
        let mut tx = self.db.begin_read_only().await?;
        require_user(&mut *tx, user_id).await?;
        let activities = tx.find_activities_by_user(user_id).await?;
        tx.commit().await?;
        Ok(activities)
    }

    /// Activities starting on any day from `from` through `to`.
    pub async fn list_activities_between(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Activity>, AppError> {
        let mut tx = self.db.begin_read_only().await?;
        require_user(&mut *tx, user_id).await?;
        let activities = tx
            .find_activities_between(user_id, start_of_day(from), end_of_day(to))
            .await?;
        tx.commit().await?;
        Ok(activities)
    }

    /// Replaces the activity's fields and re-prices it at the owner's current
    /// weight. The daily aggregate it was booked against is not adjusted.
    pub async fn update_activity(
        &self,
        user_id: Uuid,
        activity_id: Uuid,
        patch: ActivityPatch,
    ) -> Result<Activity, AppError> {
        let mut tx = self.db.begin().await?;
        let mut activity = tx
            .find_activity(activity_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Activity not found with id: {}", activity_id)))?;
        if activity.user_id != user_id {
            return Err(AppError::Forbidden(format!(
                "Activity {} does not belong to user {}",
                activity_id, user_id
            )));
        }
        let owner = require_user(&mut *tx, activity.user_id).await?;

        activity.apply_patch(patch);
        self.price(&mut activity, owner.weight_kg);
        let activity = tx.save_activity(activity).await?;
        tx.commit().await?;

        info!("Updated activity {} for user {}", activity_id, user_id);
        Ok(activity)
    }

    /// Removes the record only; calories already booked for the day remain.
    pub async fn delete_activity(&self, user_id: Uuid, activity_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.db.begin().await?;
        owned_activity(&mut *tx, user_id, activity_id).await?;
        tx.delete_activity(activity_id).await?;
        tx.commit().await?;

        debug!("Deleted activity {} of user {}", activity_id, user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::db::{ActivityStore, MemoryDatabase, MetricsStore, UserStore};
    use crate::models::health_metrics::HealthMetrics;
    use crate::models::user::{NewUser, Sex, User};
    use crate::services::calculator::StandardCalorieCalculator;

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    async fn setup() -> (ActivityService, Arc<MemoryDatabase>, Uuid) {
        let db = Arc::new(MemoryDatabase::new());
        let mut tx = db.begin().await.unwrap();
        let user = tx
            .save_user(User::new(NewUser {
                name: "Runner".to_string(),
                email: "runner@example.com".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1994, 5, 5).unwrap(),
                sex: Sex::Male,
                height_cm: 180.0,
                weight_kg: 70.0,
                activity_level: None,
            }))
            .await
            .unwrap();
        tx.commit().await.unwrap();
        let service = ActivityService::new(db.clone(), Arc::new(StandardCalorieCalculator::new()));
        (service, db, user.user_id)
    }

    fn run(start: NaiveDateTime, end: NaiveDateTime, distance: Option<f64>) -> NewActivity {
        NewActivity {
            activity_type: "RUNNING".to_string(),
            start_time: start,
            end_time: end,
            distance_km: distance,
            notes: None,
        }
    }

    /// Memory store whose transactions refuse to save daily aggregates.
    struct BrokenMetricsDatabase(MemoryDatabase);

    struct BrokenMetricsTransaction(Box<dyn Transaction>);

    #[async_trait]
    impl Database for BrokenMetricsDatabase {
        async fn begin(&self) -> Result<Box<dyn Transaction>, AppError> {
            Ok(Box::new(BrokenMetricsTransaction(self.0.begin().await?)))
        }

        async fn begin_read_only(&self) -> Result<Box<dyn Transaction>, AppError> {
            self.0.begin_read_only().await
        }
    }

    #[async_trait]
    impl UserStore for BrokenMetricsTransaction {
        async fn find_user(&mut self, user_id: Uuid) -> Result<Option<User>, AppError> {
            self.0.find_user(user_id).await
        }

        async fn find_all_users(&mut self) -> Result<Vec<User>, AppError> {
            self.0.find_all_users().await
        }

        async fn user_exists(&mut self, user_id: Uuid) -> Result<bool, AppError> {
            self.0.user_exists(user_id).await
        }

        async fn email_exists(&mut self, email: &str) -> Result<bool, AppError> {
            self.0.email_exists(email).await
        }

        async fn save_user(&mut self, user: User) -> Result<User, AppError> {
            self.0.save_user(user).await
        }

        async fn delete_user(&mut self, user_id: Uuid) -> Result<(), AppError> {
            self.0.delete_user(user_id).await
        }
    }

    #[async_trait]
    impl MetricsStore for BrokenMetricsTransaction {
        async fn find_metrics(
            &mut self,
            user_id: Uuid,
            date: NaiveDate,
        ) -> Result<Option<HealthMetrics>, AppError> {
            self.0.find_metrics(user_id, date).await
        }

        async fn find_metrics_range(
            &mut self,
            user_id: Uuid,
            from: NaiveDate,
            to: NaiveDate,
        ) -> Result<Vec<HealthMetrics>, AppError> {
            self.0.find_metrics_range(user_id, from, to).await
        }

        async fn save_metrics(&mut self, _: HealthMetrics) -> Result<HealthMetrics, AppError> {
            Err(AppError::InternalServerError("Database error".to_string()))
        }
    }

    #[async_trait]
    impl ActivityStore for BrokenMetricsTransaction {
        async fn find_activity(&mut self, activity_id: Uuid) -> Result<Option<Activity>, AppError> {
            self.0.find_activity(activity_id).await
        }

        async fn find_activities_by_user(&mut self, user_id: Uuid) -> Result<Vec<Activity>, AppError> {
            self.0.find_activities_by_user(user_id).await
        }

        async fn find_activities_between(
            &mut self,
            user_id: Uuid,
            from: NaiveDateTime,
            to: NaiveDateTime,
        ) -> Result<Vec<Activity>, AppError> {
            self.0.find_activities_between(user_id, from, to).await
        }

        async fn save_activity(&mut self, activity: Activity) -> Result<Activity, AppError> {
            self.0.save_activity(activity).await
        }

        async fn delete_activity(&mut self, activity_id: Uuid) -> Result<(), AppError> {
            self.0.delete_activity(activity_id).await
        }

        async fn activity_exists(&mut self, activity_id: Uuid) -> Result<bool, AppError> {
            self.0.activity_exists(activity_id).await
        }
    }

    #[async_trait]
    impl Transaction for BrokenMetricsTransaction {
        async fn commit(self: Box<Self>) -> Result<(), AppError> {
            self.0.commit().await
        }
    }

    #[tokio::test]
    async fn two_activities_accumulate_on_one_day() {
        let (service, db, user_id) = setup().await;
        let running = service
            .record_activity(user_id, run(at(1, 8, 0), at(1, 8, 30), Some(5.0)))
            .await
            .unwrap();
        assert_eq!(running.duration_minutes, 30);
        assert!((running.calories_burned - 343.0).abs() < 1e-9);

        let mut tx = db.begin_read_only().await.unwrap();
        let row = tx.find_metrics(user_id, at(1, 0, 0).date()).await.unwrap().unwrap();
        tx.commit().await.unwrap();
        assert!((row.calories_burned.unwrap() - 343.0).abs() < 1e-9);
        assert_eq!(row.active_minutes, Some(30));
        assert_eq!(row.distance_km, Some(5.0));
        assert_eq!(row.steps.unwrap_or(0), 0);

        let walking = service
            .record_activity(
                user_id,
                NewActivity {
                    activity_type: "WALKING".to_string(),
                    start_time: at(1, 18, 0),
                    end_time: at(1, 18, 45),
                    distance_km: None,
                    notes: Some("evening".to_string()),
                },
            )
            .await
            .unwrap();
        assert!((walking.calories_burned - 183.75).abs() < 1e-9);

        let mut tx = db.begin_read_only().await.unwrap();
        let row = tx.find_metrics(user_id, at(1, 0, 0).date()).await.unwrap().unwrap();
        assert!((row.calories_burned.unwrap() - 526.75).abs() < 1e-9);
        assert_eq!(row.active_minutes, Some(75));
        assert_eq!(row.distance_km, Some(5.0));
    }

    #[tokio::test]
    async fn intake_delta_matches_the_activity() {
        use rand::Rng;

        let (service, db, user_id) = setup().await;
        let labels = ["RUNNING", "yoga", " swimming ", "CYCLING", "chess"];
        let mut rng = rand::thread_rng();
        for _ in 0..25 {
            let day = rng.gen_range(1..=5);
            let start = at(day, rng.gen_range(0..23), rng.gen_range(0..60));
            let end = start + chrono::Duration::minutes(rng.gen_range(-30..240));
            let distance = if rng.gen_bool(0.5) { Some(rng.gen_range(0.0..20.0)) } else { None };
            let label = labels[rng.gen_range(0..labels.len())];

            let mut tx = db.begin_read_only().await.unwrap();
            let before = tx.find_metrics(user_id, start.date()).await.unwrap();
            tx.commit().await.unwrap();

            let activity = service
                .record_activity(
                    user_id,
                    NewActivity {
                        activity_type: label.to_string(),
                        start_time: start,
                        end_time: end,
                        distance_km: distance,
                        notes: None,
                    },
                )
                .await
                .unwrap();

            let mut tx = db.begin_read_only().await.unwrap();
            let after = tx.find_metrics(user_id, start.date()).await.unwrap().unwrap();
            tx.commit().await.unwrap();

            let burned_before = before.as_ref().and_then(|m| m.calories_burned).unwrap_or(0.0);
            let minutes_before = before.as_ref().and_then(|m| m.active_minutes).unwrap_or(0);
            let distance_before = before.as_ref().and_then(|m| m.distance_km).unwrap_or(0.0);
            let steps_before = before.as_ref().and_then(|m| m.steps).unwrap_or(0);

            assert!((after.calories_burned.unwrap() - burned_before - activity.calories_burned).abs() < 1e-6);
            assert_eq!(after.active_minutes.unwrap() - minutes_before, activity.duration_minutes);
            assert!((after.distance_km.unwrap_or(0.0) - distance_before - distance.unwrap_or(0.0)).abs() < 1e-6);
            assert_eq!(after.steps.unwrap_or(0), steps_before);
        }
    }

    #[tokio::test]
    async fn inverted_interval_records_zero_minutes_and_calories() {
        let (service, db, user_id) = setup().await;
        let activity = service
            .record_activity(user_id, run(at(1, 9, 0), at(1, 8, 0), None))
            .await
            .unwrap();
        assert_eq!(activity.duration_minutes, 0);
        assert_eq!(activity.calories_burned, 0.0);

        let mut tx = db.begin_read_only().await.unwrap();
        let row = tx.find_metrics(user_id, at(1, 0, 0).date()).await.unwrap().unwrap();
        assert_eq!(row.active_minutes, Some(0));
    }

    #[tokio::test]
    async fn failed_intake_leaves_no_trace() {
        let (service, db, _) = setup().await;
        let stranger = Uuid::new_v4();
        let err = service
            .record_activity(stranger, run(at(1, 8, 0), at(1, 8, 30), None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let mut tx = db.begin_read_only().await.unwrap();
        assert!(tx.find_activities_by_user(stranger).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn aggregate_failure_rolls_back_the_activity() {
        let (_, db, user_id) = setup().await;
        let broken = Arc::new(BrokenMetricsDatabase((*db).clone()));
        let service = ActivityService::new(broken, Arc::new(StandardCalorieCalculator::new()));

        let err = service
            .record_activity(user_id, run(at(1, 8, 0), at(1, 8, 30), Some(5.0)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InternalServerError(_)));

        let mut tx = db.begin_read_only().await.unwrap();
        assert!(tx.find_activities_by_user(user_id).await.unwrap().is_empty());
        assert!(tx.find_metrics(user_id, at(1, 0, 0).date()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn activity_is_booked_on_its_start_date() {
        let (service, db, user_id) = setup().await;
        service
            .record_activity(user_id, run(at(1, 23, 50), at(2, 0, 20), None))
            .await
            .unwrap();

        let mut tx = db.begin_read_only().await.unwrap();
        let first = tx.find_metrics(user_id, at(1, 0, 0).date()).await.unwrap().unwrap();
        assert_eq!(first.active_minutes, Some(30));
        assert!(tx.find_metrics(user_id, at(2, 0, 0).date()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn foreign_activity_is_hidden_and_protected() {
        let (service, db, owner) = setup().await;
        let mut tx = db.begin().await.unwrap();
        let other = tx
            .save_user(User::new(NewUser {
                name: "Other".to_string(),
                email: "other@example.com".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1980, 1, 1).unwrap(),
                sex: Sex::Other,
                height_cm: 170.0,
                weight_kg: 60.0,
                activity_level: None,
            }))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let activity = service
            .record_activity(owner, run(at(1, 8, 0), at(1, 8, 30), None))
            .await
            .unwrap();

        let err = service.get_activity(other.user_id, activity.activity_id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let patch = ActivityPatch {
            activity_type: "YOGA".to_string(),
            start_time: at(1, 8, 0),
            end_time: at(1, 9, 0),
            distance_km: None,
            notes: None,
        };
        let err = service
            .update_activity(other.user_id, activity.activity_id, patch)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = service
            .delete_activity(other.user_id, activity.activity_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(
            service.get_activity(owner, activity.activity_id).await.unwrap().activity_type,
            "RUNNING"
        );
    }

    #[tokio::test]
    async fn update_reprices_at_current_weight_without_touching_aggregate() {
        let (service, db, user_id) = setup().await;
        let activity = service
            .record_activity(user_id, run(at(1, 8, 0), at(1, 8, 30), None))
            .await
            .unwrap();

        let mut tx = db.begin().await.unwrap();
        let mut user = tx.find_user(user_id).await.unwrap().unwrap();
        user.weight_kg = Some(80.0);
        tx.save_user(user).await.unwrap();
        tx.commit().await.unwrap();

        let updated = service
            .update_activity(
                user_id,
                activity.activity_id,
                ActivityPatch {
                    activity_type: "WALKING".to_string(),
                    start_time: at(1, 8, 0),
                    end_time: at(1, 9, 0),
                    distance_km: Some(4.0),
                    notes: Some("recovery".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.duration_minutes, 60);
        assert!((updated.calories_burned - 3.5 * 80.0).abs() < 1e-9);
        assert_eq!(updated.created_at, activity.created_at);

        let mut tx = db.begin_read_only().await.unwrap();
        let row = tx.find_metrics(user_id, at(1, 0, 0).date()).await.unwrap().unwrap();
        assert!((row.calories_burned.unwrap() - 343.0).abs() < 1e-9);
        assert_eq!(row.active_minutes, Some(30));
    }

    #[tokio::test]
    async fn delete_leaves_aggregate_in_place() {
        let (service, db, user_id) = setup().await;
        let activity = service
            .record_activity(user_id, run(at(1, 8, 0), at(1, 8, 30), Some(5.0)))
            .await
            .unwrap();
        service.delete_activity(user_id, activity.activity_id).await.unwrap();

        let err = service.get_activity(user_id, activity.activity_id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let mut tx = db.begin_read_only().await.unwrap();
        let row = tx.find_metrics(user_id, at(1, 0, 0).date()).await.unwrap().unwrap();
        assert_eq!(row.distance_km, Some(5.0));
    }

    #[tokio::test]
    async fn range_query_covers_whole_days() {
        let (service, _, user_id) = setup().await;
        for (start, end) in [
            (at(1, 0, 0), at(1, 0, 30)),
            (at(2, 23, 59), at(3, 0, 10)),
            (at(3, 0, 0), at(3, 0, 10)),
        ] {
            service.record_activity(user_id, run(start, end, None)).await.unwrap();
        }
        let found = service
            .list_activities_between(user_id, at(1, 0, 0).date(), at(2, 0, 0).date())
            .await
            .unwrap();
        let starts: Vec<NaiveDateTime> = found.iter().map(|a| a.start_time).collect();
        assert_eq!(starts, vec![at(1, 0, 0), at(2, 23, 59)]);

        let all = service.list_activities(user_id).await.unwrap();
        assert_eq!(all.first().map(|a| a.start_time), Some(at(3, 0, 0)));
    }
}

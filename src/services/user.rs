use log::{info, warn};
use std::sync::Arc;
use uuid::Uuid;

use super::calculator::BmrAnalyzer;
use super::require_user;
use crate::db::Database;
use crate::errors::AppError;
use crate::models::user::{NewUser, User};
use crate::utils::clock::LocalClock;
use crate::utils::validation::validate_birth_date;

#[derive(Clone)]
pub struct UserService {
    db: Arc<dyn Database>,
    bmr: Arc<dyn BmrAnalyzer>,
    clock: LocalClock,
}

impl UserService {
    pub fn new(db: Arc<dyn Database>, bmr: Arc<dyn BmrAnalyzer>, clock: LocalClock) -> Self {
        UserService { db, bmr, clock }
    }

    pub async fn create_user(&self, profile: NewUser) -> Result<User, AppError> {
        validate_birth_date(profile.date_of_birth, self.clock.today())?;

        let mut tx = self.db.begin().await?;
        if tx.email_exists(&profile.email).await? {
            warn!("Rejected registration for existing email {}", profile.email);
            return Err(AppError::invalid(format!(
                "User with email {} already exists",
                profile.email
            )));
        }
        let user = tx.save_user(User::new(profile)).await?;
        tx.commit().await?;

        info!("Created user {}", user.user_id);
        Ok(user)
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<User, AppError> {
        let mut tx = self.db.begin_read_only().await?;
        let user = require_user(&mut *tx, user_id).await?;
        tx.commit().await?;
        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let mut tx = self.db.begin_read_only().await?;
        let users = tx.find_all_users().await?;
        tx.commit().await?;
        Ok(users)
    }

    /// Replaces the whole profile. Changing to an email held by another user fails.
    pub async fn update_user(&self, user_id: Uuid, profile: NewUser) -> Result<User, AppError> {
        validate_birth_date(profile.date_of_birth, self.clock.today())?;

        let mut tx = self.db.begin().await?;
        let mut user = require_user(&mut *tx, user_id).await?;
        if user.email != profile.email && tx.email_exists(&profile.email).await? {
            return Err(AppError::invalid(format!(
                "User with email {} already exists",
                profile.email
            )));
        }
        user.apply_profile(profile);
        let user = tx.save_user(user).await?;
        tx.commit().await?;

        info!("Updated user {}", user_id);
        Ok(user)
    }

    pub async fn delete_user(&self, user_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.db.begin().await?;
        if !tx.user_exists(user_id).await? {
            return Err(AppError::not_found(format!("User not found with id: {}", user_id)));
        }
        tx.delete_user(user_id).await?;
        tx.commit().await?;

        info!("Deleted user {} with its activities and metrics", user_id);
        Ok(())
    }

    pub async fn bmr(&self, user_id: Uuid) -> Result<f64, AppError> {
        let user = self.get_user(user_id).await?;
        self.bmr.bmr(&user, self.clock.today())
    }

    pub async fn tdee(&self, user_id: Uuid) -> Result<f64, AppError> {
        let user = self.get_user(user_id).await?;
        self.bmr.tdee(&user, self.clock.today())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDatabase;
    use crate::models::user::{ActivityLevel, Sex};
    use crate::services::calculator::MifflinStJeorAnalyzer;
    use chrono::{Datelike, NaiveDate};

    fn service() -> UserService {
        UserService::new(
            Arc::new(MemoryDatabase::new()),
            Arc::new(MifflinStJeorAnalyzer),
            LocalClock::utc(),
        )
    }

    fn profile(email: &str) -> NewUser {
        let today = LocalClock::utc().today();
        NewUser {
            name: "Sam Carter".to_string(),
            email: email.to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(today.year() - 30, 1, 1).unwrap(),
            sex: Sex::Male,
            height_cm: 180.0,
            weight_kg: 80.0,
            activity_level: Some(ActivityLevel::ModeratelyActive),
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_invalid() {
        let users = service();
        users.create_user(profile("sam@example.com")).await.unwrap();
        let err = users.create_user(profile("sam@example.com")).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
        assert_eq!(users.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_cannot_take_another_users_email() {
        let users = service();
        users.create_user(profile("first@example.com")).await.unwrap();
        let second = users.create_user(profile("second@example.com")).await.unwrap();

        let err = users
            .update_user(second.user_id, profile("first@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));

        let mut heavier = profile("second@example.com");
        heavier.weight_kg = 85.0;
        let updated = users.update_user(second.user_id, heavier).await.unwrap();
        assert_eq!(updated.weight_kg, Some(85.0));
        assert_eq!(updated.created_at, second.created_at);
    }

    #[tokio::test]
    async fn future_birth_date_is_rejected() {
        let users = service();
        let mut unborn = profile("unborn@example.com");
        unborn.date_of_birth = LocalClock::utc().today();
        let err = users.create_user(unborn).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn bmr_and_tdee_by_id() {
        let users = service();
        let user = users.create_user(profile("sam@example.com")).await.unwrap();
        assert!((users.bmr(user.user_id).await.unwrap() - 1780.0).abs() < 1e-9);
        assert!((users.tdee(user.user_id).await.unwrap() - 2759.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn missing_user_is_not_found() {
        let users = service();
        let ghost = Uuid::new_v4();
        assert!(matches!(users.get_user(ghost).await, Err(AppError::NotFound(_))));
        assert!(matches!(users.delete_user(ghost).await, Err(AppError::NotFound(_))));
        assert!(matches!(users.bmr(ghost).await, Err(AppError::NotFound(_))));
    }
}

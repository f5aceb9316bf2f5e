use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Postgres;
use uuid::Uuid;

use super::{ActivityStore, Database, MetricsStore, Transaction, UserStore};
use crate::errors::AppError;
use crate::models::activity::Activity;
use crate::models::health_metrics::HealthMetrics;
use crate::models::user::{ActivityLevel, Sex, User};

#[derive(Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn begin(&self) -> Result<Box<dyn Transaction>, AppError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTransaction { tx, read_only: false }))
    }

    async fn begin_read_only(&self) -> Result<Box<dyn Transaction>, AppError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;
        Ok(Box::new(PgTransaction { tx, read_only: true }))
    }
}

pub struct PgTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
    read_only: bool,
}

/// Enum columns are stored as text and parsed on the way out.
#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    name: String,
    email: String,
    date_of_birth: Option<NaiveDate>,
    sex: String,
    height_cm: Option<f64>,
    weight_kg: Option<f64>,
    activity_level: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let sex = row.sex.parse::<Sex>().map_err(AppError::InternalServerError)?;
        let activity_level = row
            .activity_level
            .map(|level| level.parse::<ActivityLevel>())
            .transpose()
            .map_err(AppError::InternalServerError)?;
        Ok(User {
            user_id: row.user_id,
            name: row.name,
            email: row.email,
            date_of_birth: row.date_of_birth,
            sex,
            height_cm: row.height_cm,
            weight_kg: row.weight_kg,
            activity_level,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl UserStore for PgTransaction {
    async fn find_user(&mut self, user_id: Uuid) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&mut *self.tx)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_all_users(&mut self) -> Result<Vec<User>, AppError> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users ORDER BY created_at, user_id")
            .fetch_all(&mut *self.tx)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    async fn user_exists(&mut self, user_id: Uuid) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE user_id = $1)",
        )
        .bind(user_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(exists)
    }

    async fn email_exists(&mut self, email: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)",
        )
        .bind(email)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(exists)
    }

    async fn save_user(&mut self, user: User) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (user_id, name, email, date_of_birth, sex, height_cm, weight_kg, activity_level, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW())
            ON CONFLICT (user_id) DO UPDATE SET
                name = EXCLUDED.name,
                email = EXCLUDED.email,
                date_of_birth = EXCLUDED.date_of_birth,
                sex = EXCLUDED.sex,
                height_cm = EXCLUDED.height_cm,
                weight_kg = EXCLUDED.weight_kg,
                activity_level = EXCLUDED.activity_level,
                updated_at = NOW()
            RETURNING *",
        )
        .bind(user.user_id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.date_of_birth)
        .bind(user.sex.as_str())
        .bind(user.height_cm)
        .bind(user.weight_kg)
        .bind(user.activity_level.map(|level| level.as_str()))
        .fetch_one(&mut *self.tx)
        .await?;
        User::try_from(row)
    }

    async fn delete_user(&mut self, user_id: Uuid) -> Result<(), AppError> {
        // activities and health_metrics go with it through ON DELETE CASCADE
        sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl MetricsStore for PgTransaction {
    async fn find_metrics(
        &mut self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<HealthMetrics>, AppError> {
        let sql = if self.read_only {
            "SELECT * FROM health_metrics WHERE user_id = $1 AND date = $2"
        } else {
            "SELECT * FROM health_metrics WHERE user_id = $1 AND date = $2 FOR UPDATE"
        };
        let row = sqlx::query_as::<_, HealthMetrics>(sql)
            .bind(user_id)
            .bind(date)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn find_metrics_range(
        &mut self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<HealthMetrics>, AppError> {
        let rows = sqlx::query_as::<_, HealthMetrics>(
            "SELECT * FROM health_metrics WHERE user_id = $1 AND date BETWEEN $2 AND $3 ORDER BY date",
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows)
    }

    async fn save_metrics(&mut self, metrics: HealthMetrics) -> Result<HealthMetrics, AppError> {
        let row = sqlx::query_as::<_, HealthMetrics>(
            "INSERT INTO health_metrics (metrics_id, user_id, date, steps, calories_consumed, calories_burned, distance_km, active_minutes, water_intake_liters, sleep_hours, heart_rate_avg, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW(), NOW())
            ON CONFLICT (metrics_id) DO UPDATE SET
                steps = EXCLUDED.steps,
                calories_consumed = EXCLUDED.calories_consumed,
                calories_burned = EXCLUDED.calories_burned,
                distance_km = EXCLUDED.distance_km,
                active_minutes = EXCLUDED.active_minutes,
                water_intake_liters = EXCLUDED.water_intake_liters,
                sleep_hours = EXCLUDED.sleep_hours,
                heart_rate_avg = EXCLUDED.heart_rate_avg,
                updated_at = NOW()
            RETURNING *",
        )
        .bind(metrics.metrics_id)
        .bind(metrics.user_id)
        .bind(metrics.date)
        .bind(metrics.steps)
        .bind(metrics.calories_consumed)
        .bind(metrics.calories_burned)
        .bind(metrics.distance_km)
        .bind(metrics.active_minutes)
        .bind(metrics.water_intake_liters)
        .bind(metrics.sleep_hours)
        .bind(metrics.heart_rate_avg)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }
}

#[async_trait]
impl ActivityStore for PgTransaction {
    async fn find_activity(&mut self, activity_id: Uuid) -> Result<Option<Activity>, AppError> {
        let row = sqlx::query_as::<_, Activity>("SELECT * FROM activities WHERE activity_id = $1")
            .bind(activity_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn find_activities_by_user(&mut self, user_id: Uuid) -> Result<Vec<Activity>, AppError> {
        let rows = sqlx::query_as::<_, Activity>(
            "SELECT * FROM activities WHERE user_id = $1 ORDER BY start_time DESC",
        )
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows)
    }

    async fn find_activities_between(
        &mut self,
        user_id: Uuid,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Activity>, AppError> {
        let rows = sqlx::query_as::<_, Activity>(
            "SELECT * FROM activities WHERE user_id = $1 AND start_time BETWEEN $2 AND $3 ORDER BY start_time",
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows)
    }

    async fn save_activity(&mut self, activity: Activity) -> Result<Activity, AppError> {
        let row = sqlx::query_as::<_, Activity>(
            "INSERT INTO activities (activity_id, user_id, activity_type, start_time, end_time, duration_minutes, calories_burned, distance_km, notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW(), NOW())
            ON CONFLICT (activity_id) DO UPDATE SET
                activity_type = EXCLUDED.activity_type,
                start_time = EXCLUDED.start_time,
                end_time = EXCLUDED.end_time,
                duration_minutes = EXCLUDED.duration_minutes,
                calories_burned = EXCLUDED.calories_burned,
                distance_km = EXCLUDED.distance_km,
                notes = EXCLUDED.notes,
                updated_at = NOW()
            RETURNING *",
        )
        .bind(activity.activity_id)
        .bind(activity.user_id)
        .bind(&activity.activity_type)
        .bind(activity.start_time)
        .bind(activity.end_time)
        .bind(activity.duration_minutes)
        .bind(activity.calories_burned)
        .bind(activity.distance_km)
        .bind(&activity.notes)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn delete_activity(&mut self, activity_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM activities WHERE activity_id = $1")
            .bind(activity_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn activity_exists(&mut self, activity_id: Uuid) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM activities WHERE activity_id = $1)",
        )
        .bind(activity_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(exists)
    }
}

#[async_trait]
impl Transaction for PgTransaction {
    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let PgTransaction { tx, .. } = *self;
        tx.commit().await?;
        Ok(())
    }
}

use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::errors::AppError;
use crate::handlers::activity::DateRangeQuery;
use crate::models::health_metrics::{HealthMetrics, MetricsPatch};
use crate::services::Services;
use crate::utils::validation::validate_payload;

/// Self-reported values for one day. Omitted fields keep what is stored.
#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MetricsRequest {
    date: Option<NaiveDate>,

    #[validate(range(min = 0, message = "Steps cannot be negative"))]
    steps: Option<i32>,

    #[validate(range(min = 0.0, message = "Calories consumed cannot be negative"))]
    calories_consumed: Option<f64>,

    #[validate(range(min = 0.0, message = "Calories burned cannot be negative"))]
    calories_burned: Option<f64>,

    #[validate(range(min = 0.0, message = "Distance cannot be negative"))]
    distance_km: Option<f64>,

    #[validate(range(min = 0, message = "Active minutes cannot be negative"))]
    active_minutes: Option<i32>,

    #[validate(range(min = 0.0, message = "Water intake cannot be negative"))]
    water_intake_liters: Option<f64>,

    #[validate(range(min = 0.0, message = "Sleep hours cannot be negative"))]
    sleep_hours: Option<f64>,

    #[validate(range(min = 0, message = "Heart rate cannot be negative"))]
    heart_rate_avg: Option<i32>,
}

impl MetricsRequest {
    fn into_parts(self) -> (Option<NaiveDate>, MetricsPatch) {
        let patch = MetricsPatch {
            steps: self.steps,
            calories_consumed: self.calories_consumed,
            calories_burned: self.calories_burned,
            distance_km: self.distance_km,
            active_minutes: self.active_minutes,
            water_intake_liters: self.water_intake_liters,
            sleep_hours: self.sleep_hours,
            heart_rate_avg: self.heart_rate_avg,
        };
        (self.date, patch)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResponse {
    id: Uuid,
    user_id: Uuid,
    date: NaiveDate,
    steps: Option<i32>,
    calories_consumed: Option<f64>,
    calories_burned: Option<f64>,
    distance_km: Option<f64>,
    active_minutes: Option<i32>,
    water_intake_liters: Option<f64>,
    sleep_hours: Option<f64>,
    heart_rate_avg: Option<i32>,
    net_calories: f64,
}

impl From<HealthMetrics> for MetricsResponse {
    fn from(m: HealthMetrics) -> Self {
        MetricsResponse {
            net_calories: m.net_calories(),
            id: m.metrics_id,
            user_id: m.user_id,
            date: m.date,
            steps: m.steps,
            calories_consumed: m.calories_consumed,
            calories_burned: m.calories_burned,
            distance_km: m.distance_km,
            active_minutes: m.active_minutes,
            water_intake_liters: m.water_intake_liters,
            sleep_hours: m.sleep_hours,
            heart_rate_avg: m.heart_rate_avg,
        }
    }
}

#[derive(Deserialize)]
pub struct StepsQuery {
    steps: i32,
    date: Option<NaiveDate>,
}

// POST /api/users/{id}/metrics
pub async fn save_metrics(
    services: web::Data<Services>,
    user_id: web::Path<Uuid>,
    payload: web::Json<MetricsRequest>,
) -> Result<HttpResponse, AppError> {
    validate_payload(&*payload)?;
    let (date, patch) = payload.into_inner().into_parts();
    let metrics = services.metrics.save_metrics(*user_id, date, patch).await?;
    Ok(HttpResponse::Ok().json(MetricsResponse::from(metrics)))
}

// GET /api/users/{id}/metrics/date/{date}
pub async fn get_metrics_by_date(
    services: web::Data<Services>,
    path: web::Path<(Uuid, NaiveDate)>,
) -> Result<HttpResponse, AppError> {
    let (user_id, date) = path.into_inner();
    let metrics = services.metrics.get_metrics(user_id, date).await?;
    Ok(HttpResponse::Ok().json(MetricsResponse::from(metrics)))
}

// GET /api/users/{id}/metrics/range?startDate=&endDate=
pub async fn get_metrics_in_range(
    services: web::Data<Services>,
    user_id: web::Path<Uuid>,
    query: web::Query<DateRangeQuery>,
) -> Result<HttpResponse, AppError> {
    let rows: Vec<MetricsResponse> = services
        .metrics
        .get_metrics_range(*user_id, query.start_date, query.end_date)
        .await?
        .into_iter()
        .map(MetricsResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(rows))
}

// GET /api/users/{id}/metrics/today
pub async fn get_today_metrics(
    services: web::Data<Services>,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let metrics = services.metrics.get_today_metrics(*user_id).await?;
    Ok(HttpResponse::Ok().json(MetricsResponse::from(metrics)))
}

// POST /api/users/{id}/metrics/steps?steps=&date=
pub async fn add_steps(
    services: web::Data<Services>,
    user_id: web::Path<Uuid>,
    query: web::Query<StepsQuery>,
) -> Result<HttpResponse, AppError> {
    let metrics = services
        .metrics
        .add_steps(*user_id, query.date, query.steps)
        .await?;
    Ok(HttpResponse::Ok().json(MetricsResponse::from(metrics)))
}

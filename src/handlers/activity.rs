use actix_web::{web, HttpResponse};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::errors::AppError;
use crate::models::activity::{Activity, ActivityPatch};
use crate::services::activity::NewActivity;
use crate::services::Services;
use crate::utils::datetime::deserialize_wall_clock;
use crate::utils::validation::{validate_not_blank, validate_payload};

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRequest {
    #[validate(custom = "validate_not_blank")]
    activity_type: String,

    #[serde(deserialize_with = "deserialize_wall_clock")]
    start_time: NaiveDateTime,

    #[serde(deserialize_with = "deserialize_wall_clock")]
    end_time: NaiveDateTime,

    #[validate(range(min = 0.0, message = "Distance cannot be negative"))]
    distance_km: Option<f64>,

    #[validate(length(max = 1000, message = "Notes cannot exceed 1000 characters"))]
    notes: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResponse {
    id: Uuid,
    user_id: Uuid,
    activity_type: String,
    start_time: NaiveDateTime,
    end_time: NaiveDateTime,
    duration_minutes: i32,
    calories_burned: f64,
    distance_km: Option<f64>,
    notes: Option<String>,
    average_pace: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<Activity> for ActivityResponse {
    fn from(activity: Activity) -> Self {
        ActivityResponse {
            average_pace: activity.average_pace(),
            id: activity.activity_id,
            user_id: activity.user_id,
            activity_type: activity.activity_type,
            start_time: activity.start_time,
            end_time: activity.end_time,
            duration_minutes: activity.duration_minutes,
            calories_burned: activity.calories_burned,
            distance_km: activity.distance_km,
            notes: activity.notes,
            created_at: activity.created_at,
            updated_at: activity.updated_at,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

fn respond_with_list(activities: Vec<Activity>) -> HttpResponse {
    let body: Vec<ActivityResponse> = activities.into_iter().map(ActivityResponse::from).collect();
    HttpResponse::Ok().json(body)
}

// POST /api/users/{id}/activities
pub async fn create_activity(
    services: web::Data<Services>,
    user_id: web::Path<Uuid>,
    payload: web::Json<ActivityRequest>,
) -> Result<HttpResponse, AppError> {
    validate_payload(&*payload)?;
    let req = payload.into_inner();
    let activity = services
        .activities
        .record_activity(
            *user_id,
            NewActivity {
                activity_type: req.activity_type,
                start_time: req.start_time,
                end_time: req.end_time,
                distance_km: req.distance_km,
                notes: req.notes,
            },
        )
        .await?;
    Ok(HttpResponse::Created().json(ActivityResponse::from(activity)))
}

// GET /api/users/{id}/activities
pub async fn get_activities(
    services: web::Data<Services>,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let activities = services.activities.list_activities(*user_id).await?;
    Ok(respond_with_list(activities))
}

// GET /api/users/{id}/activities/range?startDate=&endDate=
pub async fn get_activities_in_range(
    services: web::Data<Services>,
    user_id: web::Path<Uuid>,
    query: web::Query<DateRangeQuery>,
) -> Result<HttpResponse, AppError> {
    let activities = services
        .activities
        .list_activities_between(*user_id, query.start_date, query.end_date)
        .await?;
    Ok(respond_with_list(activities))
}

// GET /api/users/{id}/activities/{aid}
pub async fn get_activity(
    services: web::Data<Services>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    let (user_id, activity_id) = path.into_inner();
    let activity = services.activities.get_activity(user_id, activity_id).await?;
    Ok(HttpResponse::Ok().json(ActivityResponse::from(activity)))
}

// PUT /api/users/{id}/activities/{aid}
pub async fn update_activity(
    services: web::Data<Services>,
    path: web::Path<(Uuid, Uuid)>,
    payload: web::Json<ActivityRequest>,
) -> Result<HttpResponse, AppError> {
    validate_payload(&*payload)?;
    let (user_id, activity_id) = path.into_inner();
    let req = payload.into_inner();
    let activity = services
        .activities
        .update_activity(
            user_id,
            activity_id,
            ActivityPatch {
                activity_type: req.activity_type,
                start_time: req.start_time,
                end_time: req.end_time,
                distance_km: req.distance_km,
                notes: req.notes,
            },
        )
        .await?;
    Ok(HttpResponse::Ok().json(ActivityResponse::from(activity)))
}

// DELETE /api/users/{id}/activities/{aid}
pub async fn delete_activity(
    services: web::Data<Services>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    let (user_id, activity_id) = path.into_inner();
    services.activities.delete_activity(user_id, activity_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::Services;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyQuery {
    week_start_date: Option<NaiveDate>,
}

// GET /api/users/{id}/dashboard/summary
pub async fn get_summary(
    services: web::Data<Services>,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let summary = services.dashboard.health_summary(*user_id).await?;
    Ok(HttpResponse::Ok().json(summary))
}

// GET /api/users/{id}/dashboard/weekly?weekStartDate=
pub async fn get_weekly_stats(
    services: web::Data<Services>,
    user_id: web::Path<Uuid>,
    query: web::Query<WeeklyQuery>,
) -> Result<HttpResponse, AppError> {
    let stats = services
        .dashboard
        .weekly_stats(*user_id, query.week_start_date)
        .await?;
    Ok(HttpResponse::Ok().json(stats))
}

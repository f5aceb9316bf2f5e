use actix_web::{web, HttpResponse};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::errors::AppError;
use crate::models::user::{ActivityLevel, NewUser, Sex, User};
use crate::services::Services;
use crate::utils::validation::{validate_not_blank, validate_payload};

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    #[validate(custom = "validate_not_blank")]
    name: String,

    #[validate(email(message = "Email should be valid"))]
    email: String,

    date_of_birth: NaiveDate,

    gender: Sex,

    #[validate(range(min = 50.0, max = 300.0, message = "Height must be between 50 and 300 cm"))]
    height_cm: f64,

    #[validate(range(min = 20.0, max = 500.0, message = "Weight must be between 20 and 500 kg"))]
    weight_kg: f64,

    activity_level: Option<ActivityLevel>,
}

impl From<UserRequest> for NewUser {
    fn from(req: UserRequest) -> Self {
        NewUser {
            name: req.name,
            email: req.email,
            date_of_birth: req.date_of_birth,
            sex: req.gender,
            height_cm: req.height_cm,
            weight_kg: req.weight_kg,
            activity_level: req.activity_level,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    id: Uuid,
    name: String,
    email: String,
    date_of_birth: Option<NaiveDate>,
    gender: Sex,
    height_cm: Option<f64>,
    weight_kg: Option<f64>,
    activity_level: Option<ActivityLevel>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.user_id,
            name: user.name,
            email: user.email,
            date_of_birth: user.date_of_birth,
            gender: user.sex,
            height_cm: user.height_cm,
            weight_kg: user.weight_kg,
            activity_level: user.activity_level,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

// POST /api/users
pub async fn create_user(
    services: web::Data<Services>,
    payload: web::Json<UserRequest>,
) -> Result<HttpResponse, AppError> {
    validate_payload(&*payload)?;
    let user = services.users.create_user(payload.into_inner().into()).await?;
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

// GET /api/users
pub async fn list_users(services: web::Data<Services>) -> Result<HttpResponse, AppError> {
    let users: Vec<UserResponse> = services
        .users
        .list_users()
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(users))
}

// GET /api/users/{id}
pub async fn get_user(
    services: web::Data<Services>,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let user = services.users.get_user(*user_id).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

// PUT /api/users/{id}
pub async fn update_user(
    services: web::Data<Services>,
    user_id: web::Path<Uuid>,
    payload: web::Json<UserRequest>,
) -> Result<HttpResponse, AppError> {
    validate_payload(&*payload)?;
    let user = services
        .users
        .update_user(*user_id, payload.into_inner().into())
        .await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

// DELETE /api/users/{id}
pub async fn delete_user(
    services: web::Data<Services>,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    services.users.delete_user(*user_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

// GET /api/users/{id}/bmr
pub async fn get_bmr(
    services: web::Data<Services>,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let bmr = services.users.bmr(*user_id).await?;
    Ok(HttpResponse::Ok().json(bmr))
}

// GET /api/users/{id}/tdee
pub async fn get_tdee(
    services: web::Data<Services>,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let tdee = services.users.tdee(*user_id).await?;
    Ok(HttpResponse::Ok().json(tdee))
}

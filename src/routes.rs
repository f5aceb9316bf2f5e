use actix_web::{error, web};

use crate::errors::AppError;
use crate::handlers;

/// Registers the `/api` resource table together with extractor configs that
/// answer malformed bodies and query strings with 400.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        error::Error::from(AppError::invalid(err.to_string()))
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        error::Error::from(AppError::invalid(err.to_string()))
    }))
    .service(
        web::scope("/api/users")
            .service(
                web::resource("")
                    .route(web::get().to(handlers::users::list_users))
                    .route(web::post().to(handlers::users::create_user)),
            )
            .service(
                web::resource("/{id}")
                    .route(web::get().to(handlers::users::get_user))
                    .route(web::put().to(handlers::users::update_user))
                    .route(web::delete().to(handlers::users::delete_user)),
            )
            .service(web::resource("/{id}/bmr").route(web::get().to(handlers::users::get_bmr)))
            .service(web::resource("/{id}/tdee").route(web::get().to(handlers::users::get_tdee)))
            .service(
                web::resource("/{id}/activities")
                    .route(web::get().to(handlers::activity::get_activities))
                    .route(web::post().to(handlers::activity::create_activity)),
            )
            // Must precede /{aid} so "range" is not read as an activity id.
            .service(
                web::resource("/{id}/activities/range")
                    .route(web::get().to(handlers::activity::get_activities_in_range)),
            )
            .service(
                web::resource("/{id}/activities/{aid}")
                    .route(web::get().to(handlers::activity::get_activity))
                    .route(web::put().to(handlers::activity::update_activity))
                    .route(web::delete().to(handlers::activity::delete_activity)),
            )
            .service(
                web::resource("/{id}/metrics")
                    .route(web::post().to(handlers::metrics::save_metrics)),
            )
            .service(
                web::resource("/{id}/metrics/date/{date}")
                    .route(web::get().to(handlers::metrics::get_metrics_by_date)),
            )
            .service(
                web::resource("/{id}/metrics/range")
                    .route(web::get().to(handlers::metrics::get_metrics_in_range)),
            )
            .service(
                web::resource("/{id}/metrics/today")
                    .route(web::get().to(handlers::metrics::get_today_metrics)),
            )
            .service(
                web::resource("/{id}/metrics/steps")
                    .route(web::post().to(handlers::metrics::add_steps)),
            )
            .service(
                web::resource("/{id}/dashboard/summary")
                    .route(web::get().to(handlers::dashboard::get_summary)),
            )
            .service(
                web::resource("/{id}/dashboard/weekly")
                    .route(web::get().to(handlers::dashboard::get_weekly_stats)),
            ),
    );
}

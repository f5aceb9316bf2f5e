pub mod activity;
pub mod calculator;
pub mod dashboard;
pub mod metrics;
pub mod user;

use std::sync::Arc;
use uuid::Uuid;

use crate::db::{Database, Transaction};
use crate::errors::AppError;
use crate::models::user::User;
use crate::utils::clock::LocalClock;

pub use activity::ActivityService;
pub use calculator::{BmrAnalyzer, CalorieCalculator, MifflinStJeorAnalyzer, StandardCalorieCalculator};
pub use dashboard::DashboardService;
pub use metrics::MetricsService;
pub use user::UserService;

/// Every service the HTTP layer needs, wired to one store and one set of calculators.
#[derive(Clone)]
pub struct Services {
    pub users: UserService,
    pub activities: ActivityService,
    pub metrics: MetricsService,
    pub dashboard: DashboardService,
}

impl Services {
    pub fn new(
        db: Arc<dyn Database>,
        calories: Arc<dyn CalorieCalculator>,
        bmr: Arc<dyn BmrAnalyzer>,
        clock: LocalClock,
    ) -> Self {
        Services {
            users: UserService::new(db.clone(), bmr.clone(), clock),
            activities: ActivityService::new(db.clone(), calories),
            metrics: MetricsService::new(db.clone(), clock),
            dashboard: DashboardService::new(db, bmr, clock),
        }
    }

    /// Standard calculators (MET table, Mifflin-St Jeor).
    pub fn standard(db: Arc<dyn Database>, clock: LocalClock) -> Self {
        Services::new(
            db,
            Arc::new(StandardCalorieCalculator::new()),
            Arc::new(MifflinStJeorAnalyzer),
            clock,
        )
    }
}

pub(crate) async fn require_user(tx: &mut dyn Transaction, user_id: Uuid) -> Result<User, AppError> {
    tx.find_user(user_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User not found with id: {}", user_id)))
}

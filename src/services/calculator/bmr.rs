use chrono::NaiveDate;

use crate::errors::AppError;
use crate::models::user::{ActivityLevel, Sex, User};

pub trait BmrAnalyzer: Send + Sync {
    /// Basal metabolic rate in kcal/day, with age taken as of `today`.
    fn bmr(&self, user: &User, today: NaiveDate) -> Result<f64, AppError>;

    /// Total daily energy expenditure: BMR scaled by the activity multiplier.
    fn tdee(&self, user: &User, today: NaiveDate) -> Result<f64, AppError> {
        let multiplier = user
            .activity_level
            .map(|level| level.multiplier())
            .unwrap_or(ActivityLevel::DEFAULT_MULTIPLIER);
        Ok(self.bmr(user, today)? * multiplier)
    }
}

/// Mifflin-St Jeor: 10W + 6.25H - 5A + C.
pub struct MifflinStJeorAnalyzer;

impl MifflinStJeorAnalyzer {
    pub const MALE_CONSTANT: f64 = 5.0;
    pub const FEMALE_CONSTANT: f64 = -161.0;
    /// Midpoint of the male and female constants.
    pub const NEUTRAL_CONSTANT: f64 = -78.0;

    const WEIGHT_FACTOR: f64 = 10.0;
    const HEIGHT_FACTOR: f64 = 6.25;
    const AGE_FACTOR: f64 = 5.0;

    fn sex_constant(sex: Sex) -> f64 {
        match sex {
            Sex::Male => Self::MALE_CONSTANT,
            Sex::Female => Self::FEMALE_CONSTANT,
            Sex::Other => Self::NEUTRAL_CONSTANT,
        }
    }
}

impl BmrAnalyzer for MifflinStJeorAnalyzer {
    fn bmr(&self, user: &User, today: NaiveDate) -> Result<f64, AppError> {
        let (weight, height, age) = match (user.weight_kg, user.height_cm, user.age_on(today)) {
            (Some(weight), Some(height), Some(age)) => (weight, height, age),
            _ => {
                return Err(AppError::invalid(
                    "User data incomplete for BMR calculation",
                ))
            }
        };

        Ok(Self::WEIGHT_FACTOR * weight + Self::HEIGHT_FACTOR * height
            - Self::AGE_FACTOR * f64::from(age)
            + Self::sex_constant(user.sex))
    }
}

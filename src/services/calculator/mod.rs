//! Physiological calculators. Services receive them as trait objects so an
//! alternative formula can be selected when the service is constructed.

pub mod bmr;
pub mod calories;

pub use bmr::{BmrAnalyzer, MifflinStJeorAnalyzer};
pub use calories::{CalorieCalculator, StandardCalorieCalculator};

use chrono::NaiveDate;
use validator::{Validate, ValidationError};
use crate::errors::AppError;

pub fn validate_payload<T: Validate>(payload: &T) -> Result<(), AppError> {
    payload.validate().map_err(AppError::from)
}

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

pub fn validate_birth_date(date_of_birth: NaiveDate, today: NaiveDate) -> Result<(), AppError> {
    if date_of_birth >= today {
        return Err(AppError::invalid("Date of birth must be in the past"));
    }
    Ok(())
}

pub fn validate_steps(steps: i32) -> Result<(), AppError> {
    if steps < 0 {
        return Err(AppError::invalid("Steps cannot be negative"));
    }
    Ok(())
}

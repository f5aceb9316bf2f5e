pub mod clock;
pub mod datetime;
pub mod validation;

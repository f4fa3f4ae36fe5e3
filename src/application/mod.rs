pub mod app_error;
pub mod csv;
pub mod ports;
pub mod use_cases;
pub mod validators;

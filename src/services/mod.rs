// Dashboard view assembly
pub mod dashboard;

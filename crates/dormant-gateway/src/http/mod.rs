pub mod auth;
pub mod catalog;
pub mod error;
pub mod generate;
pub mod health;
pub mod schedules;

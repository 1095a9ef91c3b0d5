pub mod accounts;
pub mod auth;
pub mod challenges;
pub mod donations;
pub mod middleware;
pub mod profile;
pub mod views;

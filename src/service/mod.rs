pub mod auth;
pub mod booking;
pub mod car;
pub mod chat;
pub mod dashboard;
pub mod ownership;
pub mod pricing;
pub mod review;
pub mod user;

pub mod admin;
pub mod booking;
pub mod car;
pub mod chat;
pub mod dashboard;
pub mod error;
pub mod health;
pub mod review;
pub mod user;

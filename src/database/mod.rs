pub mod booking;
pub mod car;
pub mod message;
pub mod postgres_repository;
pub mod review;
pub mod session;
pub mod user;

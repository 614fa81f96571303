pub mod booking;
pub mod car;
pub mod dashboard;
pub mod message;
pub mod reference;
pub mod review;
pub mod session;
pub mod user;

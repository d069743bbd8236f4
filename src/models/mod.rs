pub mod announcement;
pub mod application;
pub mod filter;
pub mod notification;
pub mod page;

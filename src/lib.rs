pub mod config;
pub mod dispatch;
pub mod endpoints;
pub mod error;
pub mod forms;
pub mod response;

pub mod auth;
pub mod billing;
pub mod health;
pub mod leads;
pub mod notify;
pub mod pitch;

pub mod announcement;
pub mod event;
pub mod event_participant;
pub mod payment;
pub mod role;
pub mod role_permission;
pub mod role_request;
pub mod system_settings;
pub mod user;

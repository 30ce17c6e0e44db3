pub mod activity_log;
pub mod attendance;
pub mod employee;
pub mod leave_request;
pub mod permission;
pub mod role;

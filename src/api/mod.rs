pub mod activity;
pub mod attendance;
pub mod leave_request;
pub mod permission;
pub mod report;

pub mod daily_status;
pub mod export;
pub mod period;
pub mod source;

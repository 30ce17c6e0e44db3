pub mod geofence;
pub mod lateness;

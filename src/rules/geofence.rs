use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Mean Earth radius used by the haversine formula, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

#[derive(Debug, Error, PartialEq)]
pub enum GeofenceError {
    #[error("both coordinates are required for a distance check")]
    MissingCoordinate,

    #[error("invalid coordinate: lat {lat}, lon {lon}")]
    InvalidCoordinate { lat: f64, lon: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct Coordinate {
    #[schema(example = json!(-6.1754))]
    pub lat: f64,
    #[schema(example = 106.8272)]
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Result<Self, GeofenceError> {
        let valid = lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon);

        if valid {
            Ok(Self { lat, lon })
        } else {
            Err(GeofenceError::InvalidCoordinate { lat, lon })
        }
    }

    /// Builds a coordinate from nullable columns; `None` unless both are present.
    pub fn from_parts(lat: Option<f64>, lon: Option<f64>) -> Option<Self> {
        match (lat, lon) {
            (Some(lat), Some(lon)) => Self::new(lat, lon).ok(),
            _ => None,
        }
    }
}

/// Great-circle distance between two points in meters.
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).to_radians();
    let d_lambda = (b.lon - a.lon).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Distance check for values coming straight off a request or a row.
pub fn distance_between(
    a: Option<Coordinate>,
    b: Option<Coordinate>,
) -> Result<f64, GeofenceError> {
    match (a, b) {
        (Some(a), Some(b)) => Ok(distance(a, b)),
        _ => Err(GeofenceError::MissingCoordinate),
    }
}

pub fn is_within_radius(distance_meters: f64, radius_meters: f64) -> bool {
    distance_meters <= radius_meters
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum LocationVerdict {
    Inside { distance_meters: f64 },
    Outside { distance_meters: f64 },
    Unknown,
}

/// A circular boundary around the office.
#[derive(Debug, Clone, Copy)]
pub struct Geofence {
    pub center: Coordinate,
    pub radius_meters: f64,
}

impl Geofence {
    pub fn new(center: Coordinate, radius_meters: f64) -> Self {
        Self {
            center,
            radius_meters,
        }
    }

    /// Missing coordinates become `Unknown` rather than a distance.
    pub fn evaluate(&self, point: Option<Coordinate>) -> LocationVerdict {
        match distance_between(point, Some(self.center)) {
            Ok(d) if is_within_radius(d, self.radius_meters) => {
                LocationVerdict::Inside { distance_meters: d }
            }
            Ok(d) => LocationVerdict::Outside { distance_meters: d },
            Err(_) => LocationVerdict::Unknown,
        }
    }
}

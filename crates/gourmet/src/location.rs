use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocationError {
    #[error("Missing {0}")]
    Missing(&'static str),

    #[error("{0} must be a finite number")]
    NotFinite(&'static str),

    #[error("{field} {value} is out of range")]
    OutOfRange { field: &'static str, value: f64 },
}

/// Where the user is, for the duration of a single request.
///
/// Built once from the request body and handed down by value to the tools that
/// need it. There is no process-wide "current position".
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LocationContext {
    latitude: f64,
    longitude: f64,
}

impl LocationContext {
    pub fn new(latitude: Option<f64>, longitude: Option<f64>) -> Result<Self, LocationError> {
        let latitude = check("latitude", latitude, 90.0)?;
        let longitude = check("longitude", longitude, 180.0)?;
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

fn check(field: &'static str, value: Option<f64>, bound: f64) -> Result<f64, LocationError> {
    let value = value.ok_or(LocationError::Missing(field))?;
    if !value.is_finite() {
        return Err(LocationError::NotFinite(field));
    }
    if value.abs() > bound {
        return Err(LocationError::OutOfRange { field, value });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_location() {
        let location = LocationContext::new(Some(35.681), Some(139.767)).unwrap();
        assert_eq!(location.latitude(), 35.681);
        assert_eq!(location.longitude(), 139.767);
    }

    #[test]
    fn test_missing_field() {
        assert_eq!(
            LocationContext::new(None, Some(139.767)),
            Err(LocationError::Missing("latitude"))
        );
        assert_eq!(
            LocationContext::new(Some(35.0), None),
            Err(LocationError::Missing("longitude"))
        );
    }

    #[test]
    fn test_non_finite() {
        assert_eq!(
            LocationContext::new(Some(f64::NAN), Some(0.0)),
            Err(LocationError::NotFinite("latitude"))
        );
        assert_eq!(
            LocationContext::new(Some(0.0), Some(f64::INFINITY)),
            Err(LocationError::NotFinite("longitude"))
        );
    }

    #[test]
    fn test_out_of_range() {
        assert!(matches!(
            LocationContext::new(Some(91.0), Some(0.0)),
            Err(LocationError::OutOfRange { field: "latitude", .. })
        ));
        assert!(matches!(
            LocationContext::new(Some(0.0), Some(-180.5)),
            Err(LocationError::OutOfRange { field: "longitude", .. })
        ));
    }
}

//! Location context model (a geofenced place such as "@office")

use serde::{Deserialize, Serialize};

use super::entity_id;

/// Radius used when a context is created without one, in metres
pub const DEFAULT_RADIUS_METERS: f64 = 100.0;

entity_id!(
    /// A unique identifier for a location context
    ContextId
);

/// A location-based context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub id: ContextId,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Geofence radius in metres
    pub radius: f64,
}

/// Data for creating a context
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextCreate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ContextId>,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius: f64,
}

impl ContextCreate {
    #[must_use]
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: None,
            name: name.into(),
            latitude,
            longitude,
            radius: DEFAULT_RADIUS_METERS,
        }
    }

    /// Validate coordinate ranges and radius.
    pub fn validate(&self) -> Result<(), String> {
        validate_geofence(self.latitude, self.longitude, self.radius)
    }
}

/// Partial context update
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContextUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
}

/// Filters for listing contexts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextFilters {
    pub search: Option<String>,
}

/// Check that a geofence is well formed.
pub fn validate_geofence(latitude: f64, longitude: f64, radius: f64) -> Result<(), String> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(format!("latitude {latitude} is outside -90..=90"));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(format!("longitude {longitude} is outside -180..=180"));
    }
    if radius.is_nan() || radius <= 0.0 {
        return Err(format!("radius must be positive, got {radius}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_context_uses_default_radius() {
        let create = ContextCreate::new("@office", 52.52, 13.40);
        assert!((create.radius - DEFAULT_RADIUS_METERS).abs() < f64::EPSILON);
        assert!(create.validate().is_ok());
    }

    #[test]
    fn test_validate_geofence_rejects_out_of_range() {
        assert!(validate_geofence(91.0, 0.0, 10.0).is_err());
        assert!(validate_geofence(0.0, -181.0, 10.0).is_err());
        assert!(validate_geofence(0.0, 0.0, 0.0).is_err());
    }
}

use serde::Deserialize;

use crate::LocationFix;

/// An `android.location.Location` as sent by the Kotlin helper.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AndroidFix {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Altitude in meters, 0 when the fix has none.
    #[serde(default)]
    pub altitude: f64,
    /// Horizontal accuracy in meters.
    #[serde(default)]
    pub accuracy: f32,
    /// Bearing in degrees, 0 when the fix has none.
    #[serde(default)]
    pub bearing: f32,
    /// Speed in meters per second, 0 when the fix has none.
    #[serde(default)]
    pub speed: f32,
    /// Unix epoch milliseconds.
    pub time: i64,
    /// `Location.isFromMockProvider`.
    #[serde(default)]
    pub is_from_mock_provider: bool,
}

/// A `CLLocation` as sent by the Swift helper.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AppleFix {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Altitude in meters.
    pub altitude: f64,
    /// Horizontal accuracy in meters.
    pub horizontal_accuracy: f64,
    /// Course in degrees, negative when invalid.
    pub course: f64,
    /// Speed in meters per second, negative when invalid.
    pub speed: f64,
    /// Seconds since 1970.
    pub timestamp: f64,
}

/// A fix in platform shape, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformFix {
    /// From `FusedLocationProviderClient`.
    Android(AndroidFix),
    /// From `CLLocationManager`.
    Apple(AppleFix),
}

impl From<AndroidFix> for PlatformFix {
    fn from(fix: AndroidFix) -> Self {
        Self::Android(fix)
    }
}

impl From<AppleFix> for PlatformFix {
    fn from(fix: AppleFix) -> Self {
        Self::Apple(fix)
    }
}

impl From<AndroidFix> for LocationFix {
    #[allow(clippy::cast_precision_loss)]
    fn from(fix: AndroidFix) -> Self {
        Self {
            latitude: fix.latitude,
            longitude: fix.longitude,
            altitude: fix.altitude,
            accuracy: f64::from(fix.accuracy),
            bearing: f64::from(fix.bearing),
            speed: f64::from(fix.speed),
            time: fix.time as f64,
            is_mock: fix.is_from_mock_provider,
        }
    }
}

impl From<AppleFix> for LocationFix {
    fn from(fix: AppleFix) -> Self {
        Self {
            latitude: fix.latitude,
            longitude: fix.longitude,
            altitude: fix.altitude,
            accuracy: fix.horizontal_accuracy,
            bearing: valid_or_zero(fix.course),
            speed: valid_or_zero(fix.speed),
            time: fix.timestamp * 1000.0,
            is_mock: false,
        }
    }
}

impl From<PlatformFix> for LocationFix {
    fn from(fix: PlatformFix) -> Self {
        match fix {
            PlatformFix::Android(fix) => fix.into(),
            PlatformFix::Apple(fix) => fix.into(),
        }
    }
}

// CoreLocation uses negative values for "invalid".
fn valid_or_zero(value: f64) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn android_fix_widens_fields() {
        let fix: AndroidFix = serde_json::from_str(
            r#"{
                "latitude": 52.5200066,
                "longitude": 13.404954,
                "altitude": 34.5,
                "accuracy": 12.5,
                "bearing": 270.25,
                "speed": 1.5,
                "time": 1700000000123,
                "isFromMockProvider": true
            }"#,
        )
        .unwrap();

        let normalized = LocationFix::from(PlatformFix::from(fix));
        assert_eq!(
            normalized,
            LocationFix {
                latitude: 52.520_006_6,
                longitude: 13.404_954,
                altitude: 34.5,
                accuracy: 12.5,
                bearing: 270.25,
                speed: 1.5,
                time: 1_700_000_000_123.0,
                is_mock: true,
            }
        );
    }

    #[test]
    fn android_fix_without_optional_fields() {
        let fix: AndroidFix =
            serde_json::from_str(r#"{"latitude": 1.0, "longitude": 2.0, "time": 5}"#).unwrap();
        let normalized = LocationFix::from(fix);
        assert_eq!(normalized.bearing, 0.0);
        assert_eq!(normalized.speed, 0.0);
        assert!(!normalized.is_mock);
    }

    #[test]
    fn apple_fix_converts_seconds_and_invalid_course() {
        let fix = AppleFix {
            latitude: 37.33,
            longitude: -122.03,
            altitude: 10.0,
            horizontal_accuracy: 5.0,
            course: -1.0,
            speed: -1.0,
            timestamp: 1_700_000_000.5,
        };

        let normalized = LocationFix::from(fix);
        assert_eq!(normalized.latitude, 37.33);
        assert_eq!(normalized.longitude, -122.03);
        assert_eq!(normalized.accuracy, 5.0);
        assert_eq!(normalized.bearing, 0.0);
        assert_eq!(normalized.speed, 0.0);
        assert_eq!(normalized.time, 1_700_000_000_500.0);
        assert!(!normalized.is_mock);
    }

    #[test]
    fn fix_serializes_with_wire_keys() {
        let fix = LocationFix {
            latitude: 1.0,
            longitude: 2.0,
            altitude: 3.0,
            accuracy: 4.0,
            bearing: 5.0,
            speed: 6.0,
            time: 7.0,
            is_mock: false,
        };
        let value = serde_json::to_value(&fix).unwrap();
        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            [
                "accuracy",
                "altitude",
                "bearing",
                "is_mock",
                "latitude",
                "longitude",
                "speed",
                "time"
            ]
        );
    }
}

//! Setpoint computation and the per-device threshold map.
//!
//! While cooling, the setpoint follows the outdoor temperature down to
//! `outdoor - GAP`, but never below the user's threshold for that device
//! and never above [`MAX_SETPOINT`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::DeviceId;

/// Largest accepted difference between outdoor temperature and setpoint, in °C.
pub const OUTDOOR_GAP: f64 = 8.0;

/// Upper bound of any computed setpoint, in °C.
pub const MAX_SETPOINT: f64 = 38.0;

/// Threshold assumed for a device that never had one saved.
pub const DEFAULT_THRESHOLD: f64 = 0.0;

/// Compute the setpoint for a cooling device.
///
/// Without an outdoor reading the threshold itself is the target.
/// `MAX_SETPOINT` wins over a threshold set above it.
#[must_use]
pub fn compute_setpoint(outdoor: Option<f64>, threshold: f64) -> f64 {
    let follow = outdoor.map_or(threshold, |outdoor| (outdoor - OUTDOOR_GAP).ceil());
    follow.max(threshold).min(MAX_SETPOINT)
}

/// Whether two setpoints are the same temperature.
#[must_use]
pub fn same_setpoint(left: f64, right: f64) -> bool {
    (left - right).abs() < f64::EPSILON
}

/// Desired minimum setpoint per device, in °C.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Thresholds(BTreeMap<DeviceId, f64>);

impl Thresholds {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Saved threshold for `device_id`, [`DEFAULT_THRESHOLD`] if absent.
    #[must_use]
    pub fn get(&self, device_id: &DeviceId) -> f64 {
        self.0
            .get(device_id)
            .copied()
            .unwrap_or(DEFAULT_THRESHOLD)
    }

    /// Store a threshold; returns `true` if the map changed.
    pub fn set(&mut self, device_id: DeviceId, value: f64) -> bool {
        let previous = self.0.insert(device_id, value);
        previous.is_none_or(|previous| (previous - value).abs() > f64::EPSILON)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DeviceId, f64)> {
        self.0.iter().map(|(id, value)| (id, *value))
    }
}

impl FromIterator<(DeviceId, f64)> for Thresholds {
    fn from_iter<T: IntoIterator<Item = (DeviceId, f64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_follow_outdoor_when_above_threshold() {
        assert!((compute_setpoint(Some(30.0), 20.0) - 22.0).abs() < f64::EPSILON);
    }

    #[test]
    fn should_hold_threshold_when_outdoor_is_cool() {
        assert!((compute_setpoint(Some(15.0), 20.0) - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn should_clamp_to_max_when_outdoor_is_hot() {
        assert!((compute_setpoint(Some(50.0), 20.0) - MAX_SETPOINT).abs() < f64::EPSILON);
    }

    #[test]
    fn should_round_up_fractional_outdoor_readings() {
        assert!((compute_setpoint(Some(30.2), 20.0) - 23.0).abs() < f64::EPSILON);
    }

    #[test]
    fn should_use_threshold_when_outdoor_unknown() {
        assert!((compute_setpoint(None, 24.0) - 24.0).abs() < f64::EPSILON);
    }

    #[test]
    fn should_stay_within_bounds_for_a_grid_of_inputs() {
        for outdoor in (-20..=60).map(f64::from) {
            for threshold in (0..=38).map(f64::from) {
                let setpoint = compute_setpoint(Some(outdoor), threshold);
                assert!(setpoint >= threshold, "{outdoor} / {threshold}");
                assert!(setpoint <= MAX_SETPOINT, "{outdoor} / {threshold}");
                let expected = (outdoor - OUTDOOR_GAP).ceil().clamp(threshold, MAX_SETPOINT);
                assert!((setpoint - expected).abs() < f64::EPSILON);
            }
        }
    }

    #[test]
    fn should_default_missing_threshold_to_zero() {
        let thresholds = Thresholds::new();
        assert!((thresholds.get(&DeviceId::from("ac-1")) - DEFAULT_THRESHOLD).abs() < f64::EPSILON);
    }

    #[test]
    fn should_report_change_only_when_value_differs() {
        let mut thresholds = Thresholds::new();
        assert!(thresholds.set("ac-1".into(), 22.0));
        assert!(!thresholds.set("ac-1".into(), 22.0));
        assert!(thresholds.set("ac-1".into(), 23.0));
        assert_eq!(thresholds.len(), 1);
    }

    #[test]
    fn should_serialize_as_plain_map() {
        let thresholds: Thresholds = [(DeviceId::from("ac-1"), 21.0)].into_iter().collect();
        let json = serde_json::to_value(&thresholds).unwrap();
        assert_eq!(json, serde_json::json!({"ac-1": 21.0}));
    }
}

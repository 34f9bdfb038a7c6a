//! Routing configuration.
//!
//! One immutable [`RouteConfig`] value is passed into every component for
//! a batch run; there is no ambient or global routing state.

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// Configuration for one batch routing run.
///
/// Costs are expressed in internal search units where one orthogonal grid
/// step costs [`crate::router::STEP_COST`] (1000). A `via_cost` of 8000
/// therefore makes a layer change as expensive as eight grid steps.
///
/// `heuristic_weight` above 1.0 trades optimality for search speed: the
/// A* heuristic becomes inadmissible, so found paths are valid and
/// collision-free but not guaranteed shortest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Width of newly created tracks, mm.
    pub track_width: f64,
    /// Required copper-to-copper gap between different nets, mm.
    pub clearance: f64,
    /// Outer diameter of newly created vias, mm.
    pub via_size: f64,
    /// Drill diameter of newly created vias, mm.
    pub via_drill: f64,
    /// Routing grid cell size, mm.
    pub grid_step: f64,
    /// Cost of a layer change, in internal search units.
    pub via_cost: i32,
    /// A* heuristic multiplier; 1.0 is admissible, larger is faster.
    pub heuristic_weight: f32,
    /// Hard cap on search iterations for a full attempt.
    pub max_iterations: u32,
    /// Iteration budget for the cheap first-direction probe attempt.
    pub probe_iterations: u32,
    /// Names of the layers the router may use, in stack order.
    pub layers: Vec<String>,
    /// Optional rectangle blocked on all layers (for example the shadow
    /// under a fine-pitch package).
    pub restricted_zone: Option<Rect>,
    /// Radius re-opened around route endpoints that fall inside the
    /// restricted zone, mm.
    pub zone_escape_radius: f64,
    /// Radius of the extra-cost region around other nets' unrouted stub
    /// endpoints, mm.
    pub stub_proximity_radius: f64,
    /// Extra cost at the center of a stub-proximity region, in internal
    /// search units; decays linearly to zero at the radius.
    pub stub_proximity_cost: i32,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            track_width: 0.15,
            clearance: 0.15,
            via_size: 0.6,
            via_drill: 0.3,
            grid_step: 0.1,
            via_cost: 8000,
            heuristic_weight: 1.5,
            max_iterations: 200_000,
            probe_iterations: 20_000,
            layers: vec!["F.Cu".to_string(), "B.Cu".to_string()],
            restricted_zone: None,
            zone_escape_radius: 0.5,
            stub_proximity_radius: 1.0,
            stub_proximity_cost: 2000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let config = RouteConfig::default();
        assert!(config.grid_step > 0.0);
        assert!(config.heuristic_weight >= 1.0);
        assert!(config.probe_iterations <= config.max_iterations);
        assert_eq!(config.layers.len(), 2);
    }

    #[test]
    fn config_json_round_trip() {
        let config = RouteConfig {
            via_cost: 5000,
            layers: vec!["F.Cu".into(), "In1.Cu".into(), "B.Cu".into()],
            ..RouteConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: RouteConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: RouteConfig = serde_json::from_str(r#"{"clearance": 0.2}"#).unwrap();
        assert_eq!(config.clearance, 0.2);
        assert_eq!(config.track_width, RouteConfig::default().track_width);
    }
}

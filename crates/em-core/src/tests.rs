//! Unit tests for em-core primitives.

#[cfg(test)]
mod ids {
    use crate::{AreaId, LaneId, TlsId};

    #[test]
    fn index_roundtrip() {
        let id = AreaId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(AreaId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn ordering() {
        assert!(LaneId(0) < LaneId(1));
        assert!(TlsId(100) > TlsId(99));
    }

    #[test]
    fn display() {
        assert_eq!(AreaId(7).to_string(), "AreaId(7)");
    }

    #[test]
    fn serializes_as_bare_integer() {
        assert_eq!(serde_json::to_string(&LaneId(3)).unwrap(), "3");
    }
}

#[cfg(test)]
mod emission {
    use crate::{Emission, Pollutant};

    #[test]
    fn pairwise_addition() {
        let a = Emission::new(1.0, 2.0, 3.0, 4.0, 5.0);
        let b = Emission::new(10.0, 20.0, 30.0, 40.0, 50.0);
        assert_eq!(a + b, Emission::new(11.0, 22.0, 33.0, 44.0, 55.0));
    }

    #[test]
    fn total_sums_all_pollutants() {
        assert_eq!(Emission::new(1.0, 2.0, 3.0, 4.0, 5.0).total(), 15.0);
        assert_eq!(Emission::ZERO.total(), 0.0);
    }

    #[test]
    fn sum_of_iterator() {
        let parts = vec![Emission::new(1.0, 0.0, 0.0, 0.0, 0.0); 4];
        let total: Emission = parts.iter().sum();
        assert_eq!(total.co2, 4.0);
    }

    #[test]
    fn get_by_pollutant() {
        let e = Emission::new(1.0, 2.0, 3.0, 4.0, 5.0);
        let values: Vec<f64> = Pollutant::ALL.iter().map(|&p| e.get(p)).collect();
        assert_eq!(values, [1.0, 2.0, 3.0, 4.0, 5.0]);
    }
}

#[cfg(test)]
mod geo {
    use crate::{Bounds, Point2};

    #[test]
    fn enclosing_bounds() {
        let pts = [Point2::new(3.0, -1.0), Point2::new(-2.0, 4.0), Point2::new(0.0, 0.0)];
        assert_eq!(Bounds::enclosing(&pts), Some(Bounds::new(-2.0, -1.0, 3.0, 4.0)));
        assert_eq!(Bounds::enclosing(&[]), None);
    }

    #[test]
    fn validity() {
        assert!(Bounds::new(0.0, 0.0, 10.0, 5.0).is_valid());
        assert!(!Bounds::new(0.0, 0.0, 0.0, 5.0).is_valid());
        assert!(!Bounds::new(0.0, 0.0, f64::NAN, 5.0).is_valid());
    }

    #[test]
    fn closed_containment_includes_edges() {
        let b = Bounds::new(0.0, 0.0, 10.0, 10.0);
        assert!(b.contains_closed(Point2::new(10.0, 0.0)));
        assert!(!b.contains_closed(Point2::new(10.1, 0.0)));
    }
}

#[cfg(test)]
mod signal {
    use crate::{Logic, Phase};

    #[test]
    fn scaled_logic_scales_every_duration_field() {
        let logic = Logic {
            program_id:          "0".into(),
            kind:                0,
            current_phase_index: 2,
            phases:              vec![Phase::new(30.0, 20.0, 40.0, "GGrr"), Phase::new(4.0, 4.0, 4.0, "yyrr")],
            parameters:          vec![],
        };
        let scaled = logic.scaled("0-retimed", 0.5);
        assert_eq!(scaled.program_id, "0-retimed");
        assert_eq!(scaled.current_phase_index, 0);
        assert_eq!(scaled.phases[0], Phase::new(15.0, 10.0, 20.0, "GGrr"));
        assert_eq!(scaled.phases[1].state, "yyrr");
        assert_eq!(logic.cycle_secs(), 34.0);
        assert_eq!(scaled.cycle_secs(), 17.0);
    }
}

#[cfg(test)]
mod vclass {
    use crate::VehicleClass;

    #[test]
    fn known_and_unknown_names() {
        let known: VehicleClass = serde_json::from_str("\"bus\"").unwrap();
        assert_eq!(known, VehicleClass::Bus);
        let other: VehicleClass = serde_json::from_str("\"emergency\"").unwrap();
        assert_eq!(other, VehicleClass::Other("emergency".into()));
        assert_eq!(other.as_str(), "emergency");
        assert_eq!(VehicleClass::default().as_str(), "passenger");
    }
}

#[cfg(test)]
mod config {
    use std::io::Write;

    use crate::{CoreError, ExperimentConfig, VehicleClass};

    const BASE: &str = r#"{
        "emissions_threshold": 500000.0,
        "n_steps": 200,
        "window_size": 100
    }"#;

    fn with(extra: &str) -> String {
        BASE.replacen('{', &format!("{{ {extra},"), 1)
    }

    #[test]
    fn minimal_document_uses_defaults() {
        let c = ExperimentConfig::from_json_str("minimal", BASE).unwrap();
        assert_eq!(c.name, "minimal");
        assert_eq!(c.sumo_binary, "sumo");
        assert!(!c.any_action_enabled());
        assert!(c.overlay);
        assert!(c.adjust_traffic_lights.requires_speed_limit);
        assert_eq!(c.lock_area.vehicle_class, VehicleClass::Passenger);
        assert_eq!(c.reference_emissions, None);
    }

    #[test]
    fn missing_required_key_is_config_error() {
        let err = ExperimentConfig::from_json_str("broken", r#"{ "n_steps": 10 }"#).unwrap_err();
        assert!(matches!(err, CoreError::Config(ref m) if m.contains("broken")), "{err}");
    }

    #[test]
    fn weight_routing_forces_other_strategies_off() {
        let text = with(
            r#""weight_routing": {"enabled": true, "factor": 1.0},
               "limit_speed": {"enabled": true, "factor": 0.5},
               "adjust_traffic_lights": {"enabled": true, "factor": 0.5},
               "lock_area": {"enabled": true}"#,
        );
        let c = ExperimentConfig::from_json_str("weights", &text).unwrap();
        assert!(c.weight_routing.enabled);
        assert!(!c.limit_speed.enabled);
        assert!(!c.adjust_traffic_lights.enabled);
        assert!(!c.lock_area.enabled);
    }

    #[test]
    fn without_actions_forces_everything_off() {
        let text = with(
            r#""without_actions": true,
               "weight_routing": {"enabled": true},
               "limit_speed": {"enabled": true, "factor": 0.5}"#,
        );
        let c = ExperimentConfig::from_json_str("reference", &text).unwrap();
        assert!(!c.any_action_enabled());
    }

    #[test]
    fn independent_strategies_survive_validation() {
        let text = with(
            r#""limit_speed": {"enabled": true, "factor": 0.5},
               "adjust_traffic_lights": {"enabled": true, "factor": 0.8, "requires_speed_limit": false},
               "lock_area": {"enabled": true, "vehicle_class": "truck"}"#,
        );
        let c = ExperimentConfig::from_json_str("mixed", &text).unwrap();
        assert!(c.limit_speed.enabled && c.adjust_traffic_lights.enabled && c.lock_area.enabled);
        assert!(!c.adjust_traffic_lights.requires_speed_limit);
        assert_eq!(c.lock_area.vehicle_class, VehicleClass::Truck);
    }

    #[test]
    fn zero_window_rejected() {
        let text = BASE.replace("\"window_size\": 100", "\"window_size\": 0");
        assert!(ExperimentConfig::from_json_str("w0", &text).is_err());
    }

    #[test]
    fn non_positive_factor_on_enabled_strategy_rejected() {
        let text = with(r#""limit_speed": {"enabled": true, "factor": 0.0}"#);
        assert!(ExperimentConfig::from_json_str("f0", &text).is_err());

        // A disabled strategy's factor is never used.
        let text = with(r#""limit_speed": {"enabled": false, "factor": -1.0}"#);
        assert!(ExperimentConfig::from_json_str("f-off", &text).is_ok());
    }

    #[test]
    fn factor_of_a_strategy_forced_off_is_ignored() {
        let text = with(
            r#""weight_routing": {"enabled": true, "factor": 2.0},
               "limit_speed": {"enabled": true, "factor": 0.0}"#,
        );
        let c = ExperimentConfig::from_json_str("weights", &text).unwrap();
        assert!(c.weight_routing.enabled);
        assert!(!c.limit_speed.enabled);

        let text = with(
            r#""without_actions": true,
               "weight_routing": {"enabled": true, "factor": -1.0},
               "adjust_traffic_lights": {"enabled": true, "factor": 0.0}"#,
        );
        let c = ExperimentConfig::from_json_str("reference", &text).unwrap();
        assert!(!c.any_action_enabled());
    }

    #[test]
    fn surviving_weight_routing_factor_is_still_checked() {
        let text = with(r#""weight_routing": {"enabled": true, "factor": 0.0}"#);
        let err = ExperimentConfig::from_json_str("w", &text).unwrap_err();
        assert!(matches!(err, CoreError::Config(ref m) if m.contains("weight_routing.factor")), "{err}");
    }

    #[test]
    fn negative_threshold_rejected() {
        let text = BASE.replace("500000.0", "-1.0");
        assert!(ExperimentConfig::from_json_str("neg", &text).is_err());
    }

    #[test]
    fn load_names_config_after_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("speed_50.json");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(with(r#""reference_emissions": {"co2": 1.0, "co": 2.0, "nox": 3.0, "hc": 4.0, "pmx": 5.0}"#).as_bytes())
            .unwrap();
        drop(f);

        let c = ExperimentConfig::load(&path).unwrap();
        assert_eq!(c.name, "speed_50");
        assert_eq!(c.reference_emissions.unwrap().total(), 15.0);
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let err = ExperimentConfig::load(std::path::Path::new("/nonexistent/cfg.json")).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }
}

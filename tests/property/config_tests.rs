//! Property-based tests for configuration and route validation

use std::time::Duration;

use proptest::prelude::*;
use mock_simulator::config::{parse_duration, SimulatorConfig};
use mock_simulator::types::{MockRoute, RouteInput, RouteRules};

proptest! {
    /// Test that valid port numbers pass validation
    #[test]
    fn test_valid_port_passes(port in 1u16..=65535) {
        let mut config = SimulatorConfig::default();
        config.server.port = port;

        let result = config.validate();
        prop_assert!(result.is_ok(), "Port {} should be valid", port);
    }

    /// Max delay must stay below the request timeout
    #[test]
    fn test_max_delay_against_timeout(max_delay_ms in 1u64..200_000, timeout_secs in 1u64..200) {
        let mut config = SimulatorConfig::default();
        config.latency.max_delay_ms = max_delay_ms;
        config.server.request_timeout = Duration::from_secs(timeout_secs);

        let valid = config.validate().is_ok();
        prop_assert_eq!(valid, max_delay_ms < timeout_secs * 1000);
    }

    /// Durations parse in every supported unit
    #[test]
    fn test_parse_duration_units(value in 0u64..100_000) {
        prop_assert_eq!(parse_duration(&format!("{}ms", value)), Ok(Duration::from_millis(value)));
        prop_assert_eq!(parse_duration(&format!("{}s", value)), Ok(Duration::from_secs(value)));
        prop_assert_eq!(parse_duration(&value.to_string()), Ok(Duration::from_secs(value)));
    }

    /// Status codes are accepted exactly within 100-599
    #[test]
    fn test_status_code_range(status in -1000i64..2000) {
        let mut route = MockRoute::draft(1, 1);
        let result = RouteInput::default().status(status).apply_to(&mut route, &RouteRules::default());

        prop_assert_eq!(result.is_ok(), (100..=599).contains(&status));
    }

    /// Delays are accepted exactly within 0..=max
    #[test]
    fn test_delay_range(delay in -10_000i64..100_000, max in 1u64..60_000) {
        let mut route = MockRoute::draft(1, 1);
        let rules = RouteRules { max_delay_ms: max };
        let result = RouteInput::default().delay(delay).apply_to(&mut route, &rules);

        prop_assert_eq!(result.is_ok(), delay >= 0 && delay as u64 <= max);
        if result.is_ok() {
            prop_assert_eq!(route.delay_ms, delay as u64);
        }
    }
}

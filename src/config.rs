use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use tracing::{info, warn};

use crate::engine::{EngineSettings, PlannerEngine};
use crate::model::{ColorMode, ContainerKind, ContainerSpec};
use crate::tuning::PlannerConfig;
use crate::units::GridSize;

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub planner: PlanningConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            planner: PlanningConfig::from_env(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8080;

    fn from_env() -> Self {
        let host_value =
            env_string("STACK_IT_NOW_API_HOST").unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let (bind_ip, effective_host) = match host_value.parse::<IpAddr>() {
            Ok(ip) => (ip, host_value),
            Err(err) => {
                warn!(
                    "⚠️ Could not parse STACK_IT_NOW_API_HOST ('{}'): {}. Using {}.",
                    host_value,
                    err,
                    Self::DEFAULT_HOST
                );
                (
                    IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                    Self::DEFAULT_HOST.to_string(),
                )
            }
        };

        let port = match env_string("STACK_IT_NOW_API_PORT") {
            Some(raw) => match raw.parse::<u16>() {
                Ok(value) if value != 0 => value,
                Ok(_) => {
                    warn!(
                        "⚠️ STACK_IT_NOW_API_PORT must not be 0. Using {}.",
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
                Err(err) => {
                    warn!(
                        "⚠️ Could not parse STACK_IT_NOW_API_PORT ('{}'): {}. Using {}.",
                        raw,
                        err,
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
            },
            None => Self::DEFAULT_PORT,
        };

        Self {
            bind_ip,
            display_host: effective_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }
}

/// Startup state of the planner: container, interactive settings and heuristics.
#[derive(Clone, Debug, PartialEq)]
pub struct PlanningConfig {
    pub container: ContainerSpec,
    pub settings: EngineSettings,
    pub tuning: PlannerConfig,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            container: ContainerSpec::default(),
            settings: EngineSettings {
                grid: GridSize::default(),
                snap_to_grid: true,
                color_mode: ColorMode::default(),
            },
            tuning: PlannerConfig::default(),
        }
    }
}

impl PlanningConfig {
    const CONTAINER_VAR: &'static str = "STACK_IT_NOW_CONTAINER";
    const GRID_SIZE_VAR: &'static str = "STACK_IT_NOW_GRID_SIZE";
    const SNAP_VAR: &'static str = "STACK_IT_NOW_SNAP_TO_GRID";
    const COLOR_MODE_VAR: &'static str = "STACK_IT_NOW_COLOR_MODE";
    const SUPPORT_RATIO_VAR: &'static str = "STACK_IT_NOW_SUPPORT_RATIO";
    const BOUNDARY_TOLERANCE_VAR: &'static str = "STACK_IT_NOW_BOUNDARY_TOLERANCE";
    const TWO_PERSON_RATIO_VAR: &'static str = "STACK_IT_NOW_TWO_PERSON_RATIO";
    const SCAN_BUDGET_VAR: &'static str = "STACK_IT_NOW_SCAN_BUDGET";

    fn from_env() -> Self {
        let defaults = Self::default();

        let container = env_string(Self::CONTAINER_VAR)
            .and_then(|raw| parse_container(&raw, Self::CONTAINER_VAR))
            .map(ContainerKind::spec)
            .unwrap_or(defaults.container);

        let grid = env_string(Self::GRID_SIZE_VAR)
            .and_then(|raw| parse_grid_size(&raw, Self::GRID_SIZE_VAR))
            .unwrap_or(defaults.settings.grid);

        let snap_to_grid = env_string(Self::SNAP_VAR)
            .and_then(|raw| parse_bool(&raw, Self::SNAP_VAR))
            .unwrap_or(defaults.settings.snap_to_grid);

        let color_mode = env_string(Self::COLOR_MODE_VAR)
            .and_then(|raw| parse_color_mode(&raw, Self::COLOR_MODE_VAR))
            .unwrap_or(defaults.settings.color_mode);

        let support_ratio = load_f64_with_warning(
            Self::SUPPORT_RATIO_VAR,
            PlannerConfig::DEFAULT_SUPPORT_RATIO,
            |value| (0.0..=1.0).contains(&value),
            "must be between 0 and 1",
            "Adjusted minimum support changes which stacks count as floating",
        );

        let boundary_tolerance = load_f64_with_warning(
            Self::BOUNDARY_TOLERANCE_VAR,
            PlannerConfig::DEFAULT_BOUNDARY_TOLERANCE,
            |value| value >= 0.0,
            "must not be negative",
            "Adjusted boundary tolerance lets items reach past the walls",
        );

        let two_person_ratio = load_f64_with_warning(
            Self::TWO_PERSON_RATIO_VAR,
            PlannerConfig::DEFAULT_TWO_PERSON_RATIO,
            |value| (0.0..=1.0).contains(&value),
            "must be between 0 and 1",
            "Adjusted two-person threshold changes load plan tips",
        );

        let scan_budget = match env_string(Self::SCAN_BUDGET_VAR) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(value) if value > 0 => value,
                Ok(_) => {
                    warn!(
                        "⚠️ {} must be greater than 0. Using {}.",
                        Self::SCAN_BUDGET_VAR,
                        PlannerConfig::DEFAULT_SCAN_BUDGET
                    );
                    PlannerConfig::DEFAULT_SCAN_BUDGET
                }
                Err(err) => {
                    warn!(
                        "⚠️ Could not parse {} ('{}'): {}. Using {}.",
                        Self::SCAN_BUDGET_VAR,
                        raw,
                        err,
                        PlannerConfig::DEFAULT_SCAN_BUDGET
                    );
                    PlannerConfig::DEFAULT_SCAN_BUDGET
                }
            },
            None => PlannerConfig::DEFAULT_SCAN_BUDGET,
        };

        let tuning = PlannerConfig::builder()
            .support_ratio(support_ratio)
            .boundary_tolerance(boundary_tolerance)
            .two_person_ratio(two_person_ratio)
            .scan_budget(scan_budget)
            .build();

        Self {
            container,
            settings: EngineSettings {
                grid,
                snap_to_grid,
                color_mode,
            },
            tuning,
        }
    }

    /// Builds an empty engine from this configuration.
    pub fn engine(&self) -> PlannerEngine {
        PlannerEngine::new(self.container.clone(), self.settings, self.tuning)
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            warn!(
                "⚠️ Access to {} failed: {}. Using default value.",
                name, err
            );
            None
        }
    }
}

fn parse_bool(raw: &str, var_name: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        other => {
            warn!(
                "⚠️ Could not interpret {} ('{}') as boolean value. Using default value.",
                var_name, other
            );
            None
        }
    }
}

fn parse_container(raw: &str, var_name: &str) -> Option<ContainerKind> {
    let key = raw.trim().to_ascii_lowercase();
    let kind = ContainerKind::from_key(&key);
    if kind.is_none() {
        warn!(
            "⚠️ Unknown container '{}' in {}. Expected one of 20ft, 40ft, 40ft-hc.",
            raw, var_name
        );
    }
    kind
}

fn parse_grid_size(raw: &str, var_name: &str) -> Option<GridSize> {
    match raw.trim().parse::<f64>() {
        Ok(inches) => match GridSize::from_inches(inches) {
            Ok(grid) => Some(grid),
            Err(err) => {
                warn!("⚠️ {} rejected: {}. Using default grid.", var_name, err);
                None
            }
        },
        Err(err) => {
            warn!(
                "⚠️ Could not parse {} ('{}') as number: {}. Using default grid.",
                var_name, raw, err
            );
            None
        }
    }
}

fn parse_color_mode(raw: &str, var_name: &str) -> Option<ColorMode> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "category" => Some(ColorMode::Category),
        "palette" => Some(ColorMode::Palette),
        other => {
            warn!(
                "⚠️ Unknown colour mode '{}' in {}. Using default value.",
                other, var_name
            );
            None
        }
    }
}

fn load_f64_with_warning(
    var_name: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> f64 {
    match env_string(var_name) {
        Some(raw) => match raw.parse::<f64>() {
            Ok(value) => {
                if !validator(value) {
                    warn!(
                        "⚠️ {} contains invalid value '{}': {}. Using {}.",
                        var_name, raw, invalid_hint, default
                    );
                    default
                } else {
                    let tolerance = (default.abs().max(1.0)) * 1e-9;
                    if (value - default).abs() > tolerance {
                        info!("⚠️ {} ({} = {}).", warning, var_name, value);
                    }
                    value
                }
            }
            Err(err) => {
                warn!(
                    "⚠️ Could not parse {} ('{}') as number: {}. Using {}.",
                    var_name, raw, err, default
                );
                default
            }
        },
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_true_values() {
        assert_eq!(parse_bool("1", "TEST_VAR"), Some(true));
        assert_eq!(parse_bool("true", "TEST_VAR"), Some(true));
        assert_eq!(parse_bool("yes", "TEST_VAR"), Some(true));
        assert_eq!(parse_bool("on", "TEST_VAR"), Some(true));

        assert_eq!(parse_bool("TRUE", "TEST_VAR"), Some(true));
        assert_eq!(parse_bool(" true ", "TEST_VAR"), Some(true));
    }

    #[test]
    fn test_parse_bool_false_values() {
        assert_eq!(parse_bool("0", "TEST_VAR"), Some(false));
        assert_eq!(parse_bool("false", "TEST_VAR"), Some(false));
        assert_eq!(parse_bool("no", "TEST_VAR"), Some(false));
        assert_eq!(parse_bool("off", "TEST_VAR"), Some(false));

        assert_eq!(parse_bool("OFF", "TEST_VAR"), Some(false));
        assert_eq!(parse_bool("  0  ", "TEST_VAR"), Some(false));
    }

    #[test]
    fn test_parse_bool_invalid_values() {
        assert_eq!(parse_bool("invalid", "TEST_VAR"), None);
        assert_eq!(parse_bool("2", "TEST_VAR"), None);
        assert_eq!(parse_bool("", "TEST_VAR"), None);
    }

    #[test]
    fn test_parse_container_keys() {
        assert_eq!(
            parse_container("20ft", "TEST_VAR"),
            Some(ContainerKind::TwentyFoot)
        );
        assert_eq!(
            parse_container(" 40FT-HC ", "TEST_VAR"),
            Some(ContainerKind::FortyFootHighCube)
        );
        assert_eq!(parse_container("45ft", "TEST_VAR"), None);
    }

    #[test]
    fn test_parse_grid_size() {
        assert_eq!(parse_grid_size("12", "TEST_VAR"), Some(GridSize::Twelve));
        assert_eq!(parse_grid_size("3.0", "TEST_VAR"), Some(GridSize::Three));
        assert_eq!(parse_grid_size("5", "TEST_VAR"), None);
        assert_eq!(parse_grid_size("six", "TEST_VAR"), None);
    }

    #[test]
    fn test_parse_color_mode() {
        assert_eq!(
            parse_color_mode("Palette", "TEST_VAR"),
            Some(ColorMode::Palette)
        );
        assert_eq!(parse_color_mode("rainbow", "TEST_VAR"), None);
    }

    #[test]
    fn test_default_planning_config_snaps_to_six_inches() {
        let config = PlanningConfig::default();
        assert!(config.settings.snap_to_grid);
        assert_eq!(config.settings.scan_step(), 6.0);
        assert_eq!(config.container.kind, Some(ContainerKind::FortyFoot));
        assert!(config.engine().items().is_empty());
    }
}

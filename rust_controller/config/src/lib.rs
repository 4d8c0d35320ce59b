#![allow(non_snake_case)]

extern crate control_model;
extern crate controller;
extern crate prelude;
extern crate serde;
extern crate thiserror;
extern crate toml;

use serde::Deserialize;
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use control_model::{Fidelity, VehicleParameters};
use controller::{FixedControllerParameters, RuntimeControllerParameters};
use prelude::*;

pub static DEFAULT_CONFIG_FILE: &'static str = "simulator.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read {path}: {source}")]
    Io { path: String, source: io::Error },
    #[error("unable to deserialise configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Every section may be left out of the file and takes its defaults.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub vehicle: VehicleParameters,
    pub fixed: FixedControllerParameters,
    pub runtime: RuntimeControllerParameters,
    pub simulator: SimulatorConfig,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Simulated time (s).
    pub t: float,
    /// Model that advances the simulated vehicle.
    pub fidelity: Fidelity,
    /// Curvature of the centreline (1/m). Zero for a straight.
    pub curvature: float,
    /// Degree of the centreline window polynomials.
    pub window_degree: usize,
    pub initial_speed: float,
    /// Initial lateral offset from the centreline, positive to the left (m).
    pub initial_offset: float,
    pub max_error: float,
    /// Sleep out the remainder of each sample period.
    pub real_time: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        SimulatorConfig {
            t: 10.0,
            fidelity: Fidelity::Dynamic,
            curvature: 0.0,
            window_degree: 5,
            initial_speed: 5.0,
            initial_offset: 0.0,
            max_error: 2.0,
            real_time: false,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let config_str = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        config_str.parse()
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Config, ConfigError> {
        Ok(toml::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_document() {
        let config: Config = r#"
            [vehicle]
            mass = 1500.0
            ts = 0.1

            [fixed]
            horizon = 15
            alpha_L = 2.0
            max_iterations = 50

            [runtime]
            n = 4
            alpha_c = 3.0

            [simulator]
            t = 2.5
            fidelity = "kinematic"
            curvature = 0.02
        "#
        .parse()
        .unwrap();

        assert_eq!(config.vehicle.mass, 1500.0);
        assert_eq!(config.vehicle.ts, 0.1);
        assert_eq!(config.vehicle.lf, VehicleParameters::default().lf);
        assert_eq!(config.fixed.horizon, 15);
        assert_eq!(config.fixed.alpha_L, 2.0);
        assert_eq!(config.fixed.max_iterations, 50);
        assert_eq!(config.fixed.tolerance, 1e-4);
        assert_eq!(config.runtime.n, 4);
        assert_eq!(config.runtime.alpha_c, 3.0);
        assert_eq!(config.simulator.t, 2.5);
        assert_eq!(config.simulator.fidelity, Fidelity::Kinematic);
        assert_eq!(config.simulator.curvature, 0.02);
        assert_eq!(config.simulator.window_degree, 5);
    }

    #[test]
    fn empty_document_gives_defaults() {
        let config: Config = "".parse().unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.fixed.horizon, 10);
        assert_eq!(config.vehicle.ts, 0.05);
    }

    #[test]
    fn rejects_unknown_fidelity() {
        let result = "[simulator]\nfidelity = \"quantum\"\n".parse::<Config>();
        assert!(match result {
            Err(ConfigError::Parse(_)) => true,
            _ => false,
        });
    }

    #[test]
    fn missing_file_names_path() {
        match Config::load("does/not/exist.toml") {
            Err(e @ ConfigError::Io { .. }) => {
                assert!(e.to_string().contains("does/not/exist.toml"))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn bundled_simulator_config_parses() {
        let config: Config = include_str!("../../simulator/simulator.toml").parse().unwrap();
        assert_eq!(config.simulator.fidelity, Fidelity::Dynamic);
        assert!(config.simulator.curvature > 0.0);
    }
}

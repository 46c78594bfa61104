//! Simulation configuration loaded from YAML.
//!
//! Every section is optional; missing sections and fields take their defaults.

use std::path::Path;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::common::{PlannerError, PlannerResult};
use crate::mapping::{GridConfig, OccupancyGrid};
use crate::path_planning::CarRrtConfig;
use crate::vehicle::{FootprintConfig, VehicleFootprint};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub vehicle: FootprintConfig,
    #[serde(default)]
    pub planner: CarRrtConfig,
}

impl SimulationConfig {
    /// Load and validate configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> PlannerResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        debug!("loaded configuration from {}", path.as_ref().display());
        Self::from_yaml(&contents)
    }

    /// Parse and validate configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> PlannerResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> PlannerResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> PlannerResult<()> {
        if self.grid.resolution == 0 {
            return Err(PlannerError::InvalidParameter(
                "grid.resolution must be at least 1".to_string(),
            ));
        }
        let v = &self.vehicle;
        if !(v.length > 0.0 && v.width > 0.0) {
            return Err(PlannerError::InvalidParameter(format!(
                "vehicle dimensions must be positive, got {} x {}",
                v.length, v.width
            )));
        }
        if !(v.query_radius >= 0.0) {
            return Err(PlannerError::InvalidParameter(
                "vehicle.query_radius must be non-negative".to_string(),
            ));
        }
        self.planner.validate()
    }

    /// The configured raster, or an empty grid of the configured resolution
    pub fn build_grid(&self) -> PlannerResult<OccupancyGrid> {
        match &self.grid.raster {
            Some(path) => {
                let grid = OccupancyGrid::load(path)?;
                if grid.resolution() != self.grid.resolution {
                    warn!(
                        "raster {} is {}x{}, overriding configured resolution {}",
                        path,
                        grid.resolution(),
                        grid.resolution(),
                        self.grid.resolution
                    );
                }
                Ok(grid)
            }
            None => OccupancyGrid::new(self.grid.resolution),
        }
    }

    pub fn build_footprint(&self) -> VehicleFootprint {
        VehicleFootprint::new(self.vehicle.clone())
    }
}

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::models::Status;

pub const CONFIG_ENV_VAR: &str = "DASHBOARD_CONFIG";
pub const MAX_TREND_DAYS: usize = 3660;

/// How grouped rows combine successive progress/duration values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AveragingPolicy {
    /// `(avg + next) / 2`. Order-dependent; kept so existing dashboards
    /// show the same numbers.
    #[default]
    Fold,
    /// Arithmetic mean.
    Mean,
}

/// Minimum value shown per status category in the distribution chart.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DisplayFloors {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub blocked: usize,
    pub overdue: usize,
}

impl Default for DisplayFloors {
    fn default() -> Self {
        Self {
            pending: 15,
            in_progress: 8,
            completed: 12,
            blocked: 3,
            overdue: 2,
        }
    }
}

impl DisplayFloors {
    pub fn none() -> Self {
        Self {
            pending: 0,
            in_progress: 0,
            completed: 0,
            blocked: 0,
            overdue: 0,
        }
    }

    pub fn floor_for(&self, status: Status) -> usize {
        match status {
            Status::Pending => self.pending,
            Status::InProgress => self.in_progress,
            Status::Completed => self.completed,
            Status::Blocked => self.blocked,
            Status::Overdue => self.overdue,
        }
    }

    pub fn apply(&self, status: Status, count: usize) -> usize {
        count.max(self.floor_for(status))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DashboardConfig {
    pub averaging: AveragingPolicy,
    pub display_floors: DisplayFloors,
    pub trend_days: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            averaging: AveragingPolicy::default(),
            display_floors: DisplayFloors::default(),
            trend_days: 30,
        }
    }
}

impl DashboardConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: DashboardConfig =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Explicit path first, then `DASHBOARD_CONFIG`, then defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));

        match path {
            Some(path) => {
                log::info!("loading dashboard config from {}", path.display());
                Self::from_path(&path)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trend_days == 0 {
            return Err(ConfigError::Invalid(
                "trendDays must be at least 1".to_string(),
            ));
        }
        if self.trend_days > MAX_TREND_DAYS {
            return Err(ConfigError::Invalid(format!(
                "trendDays must be at most {MAX_TREND_DAYS}, got {}",
                self.trend_days
            )));
        }
        Ok(())
    }
}

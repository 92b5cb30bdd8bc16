use std::path::PathBuf;
use std::time::Duration;

use scouted_shared::{Gender, PointsFormula, ViewDefaults};

pub const SERVER_PORT: u16 = 3000;
pub const DEFAULT_DATA_DIR: &str = "data";
pub const PLAYERS_DIR: &str = "Players";
pub const MATCHES_DIR: &str = "Matches";

pub const DEFAULT_GENDER: Gender = Gender::Men;
pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const DEFAULT_MAX_PAGE_SIZE: usize = 500;
pub const CATALOG_REFRESH_SECS: u64 = 60;

fn env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
}

pub fn server_port() -> u16 {
    env_parsed::<u16>("PORT")
        .filter(|value| *value > 0)
        .unwrap_or(SERVER_PORT)
}

pub fn data_dir() -> PathBuf {
    std::env::var("DATA_DIR")
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

pub fn default_gender() -> Gender {
    env_parsed::<Gender>("DEFAULT_GENDER").unwrap_or(DEFAULT_GENDER)
}

pub fn max_page_size() -> usize {
    env_parsed::<usize>("MAX_PAGE_SIZE")
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_MAX_PAGE_SIZE)
}

/// Never larger than [`max_page_size`].
pub fn page_size() -> usize {
    env_parsed::<usize>("PAGE_SIZE")
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .min(max_page_size())
}

pub fn catalog_refresh_interval() -> Duration {
    env_parsed::<u64>("CATALOG_REFRESH_SECS")
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(CATALOG_REFRESH_SECS))
}

/// Weights may be zero, which drops that term from the points total.
pub fn points_formula() -> PointsFormula {
    PointsFormula {
        goal_weight: env_parsed::<u32>("POINTS_GOAL_WEIGHT")
            .unwrap_or(PointsFormula::DEFAULT.goal_weight),
        assist_weight: env_parsed::<u32>("POINTS_ASSIST_WEIGHT")
            .unwrap_or(PointsFormula::DEFAULT.assist_weight),
    }
}

/// Settings read once at startup and shared by every handler.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub view_defaults: ViewDefaults,
    pub points: PointsFormula,
    pub refresh_interval: Duration,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            data_dir: data_dir(),
            view_defaults: ViewDefaults {
                gender: default_gender(),
                page_size: page_size(),
                max_page_size: max_page_size(),
            },
            points: points_formula(),
            refresh_interval: catalog_refresh_interval(),
        }
    }

    /// Built-in defaults rooted at `data_dir`, ignoring the environment.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            view_defaults: ViewDefaults {
                gender: DEFAULT_GENDER,
                page_size: DEFAULT_PAGE_SIZE,
                max_page_size: DEFAULT_MAX_PAGE_SIZE,
            },
            points: PointsFormula::DEFAULT,
            refresh_interval: Duration::from_secs(CATALOG_REFRESH_SECS),
        }
    }

    pub fn default_gender(&self) -> Gender {
        self.view_defaults.gender
    }
}

use crate::sheets::MEMBER_SLOTS;
use eyre::{WrapErr, ensure};
use serde::Deserialize;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub sheets: SheetsConfig,
    pub teams: TeamsConfig,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Csv,
    Sql,
    Memory,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: Backend,
    /// Directory of the csv backend.
    pub path: PathBuf,
    /// Connection string of the sql backend.
    pub url: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Csv,
            path: PathBuf::from("sheets"),
            url: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SheetsConfig {
    pub students: String,
    pub teams: String,
    pub requests: String,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            students: "Form Responses 1".to_owned(),
            teams: "Teams".to_owned(),
            requests: "Requests".to_owned(),
        }
    }
}

/// Bounds on the number of students in a team, leader included.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TeamsConfig {
    pub min_size: usize,
    pub max_size: usize,
}

impl Default for TeamsConfig {
    fn default() -> Self {
        Self {
            min_size: 4,
            max_size: MEMBER_SLOTS + 1,
        }
    }
}

impl TeamsConfig {
    pub fn sizes(&self) -> RangeInclusive<usize> {
        self.min_size..=self.max_size
    }
}

impl Config {
    /// Load the configuration from `path`. A missing file gives the defaults.
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .wrap_err_with(|| format!("cannot read configuration file {}", path.display()))?;
            Self::parse(&content)
                .wrap_err_with(|| format!("cannot load configuration file {}", path.display()))?
        } else {
            Self::default()
        };
        Ok(config)
    }

    pub fn parse(content: &str) -> eyre::Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> eyre::Result<()> {
        ensure!(self.teams.min_size >= 1, "teams.min_size must be at least 1");
        ensure!(
            self.teams.min_size <= self.teams.max_size,
            "teams.min_size ({}) exceeds teams.max_size ({})",
            self.teams.min_size,
            self.teams.max_size
        );
        ensure!(
            self.teams.max_size <= MEMBER_SLOTS + 1,
            "teams.max_size cannot exceed {} (one leader and {} members)",
            MEMBER_SLOTS + 1,
            MEMBER_SLOTS
        );
        if self.store.backend == Backend::Sql {
            ensure!(
                self.store.url.is_some(),
                "store.url is required by the sql backend"
            );
        }
        Ok(())
    }
}

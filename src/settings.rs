use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::RwLock,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolverSettings {
    /// State code of a thread that is on a CPU. Running states inherit the
    /// waker recorded on the runnable state before them.
    pub running_state: String,
    /// Rows requested for the prev/next lookups. Anything above 1 lets the
    /// resolver notice overlapping intervals.
    pub adjacency_probe_limit: u32,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            running_state: "Running".into(),
            adjacency_probe_limit: 2,
        }
    }
}

impl ResolverSettings {
    pub fn validate(&self) -> Result<()> {
        if self.running_state.is_empty() {
            bail!("runningState must not be empty");
        }
        if self.adjacency_probe_limit == 0 {
            bail!("adjacencyProbeLimit must be at least 1");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct UserSettings {
    resolver: ResolverSettings,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    /// Loads settings from `path`, falling back to defaults when the file is missing.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            Self::read(&path)?
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    fn read(path: &Path) -> Result<UserSettings> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        let data: UserSettings = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings in {}", path.display()))?;
        data.resolver.validate()?;
        Ok(data)
    }

    pub fn resolver(&self) -> ResolverSettings {
        match self.data.read() {
            Ok(guard) => guard.resolver.clone(),
            Err(poisoned) => poisoned.into_inner().resolver.clone(),
        }
    }

    pub fn update_resolver(&self, settings: ResolverSettings) -> Result<()> {
        settings.validate()?;
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.resolver = settings;
        self.persist(&guard)
    }

    pub fn reload(&self) -> Result<()> {
        let data = Self::read(&self.path)?;
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = data;
        Ok(())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::checklist;
use crate::gate::GateIds;

/// Per-project configuration, stored at `.certo/config.toml`.
///
/// A missing file yields defaults; unknown keys are ignored so older
/// binaries tolerate newer configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub project: ProjectSection,
    #[serde(default)]
    pub gate: GateSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectSection {
    /// Display name used in reports and `ct status`.
    #[serde(default)]
    pub name: String,
}

/// Overrides for the checklist item ids the gate engine treats specially.
/// Defaults match the built-in checklist template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateSection {
    #[serde(default = "default_regression_item")]
    pub regression_item: String,
    #[serde(default = "default_security_item")]
    pub security_item: String,
    #[serde(default = "default_performance_item")]
    pub performance_item: String,
}

impl Default for GateSection {
    fn default() -> Self {
        Self {
            regression_item: default_regression_item(),
            security_item: default_security_item(),
            performance_item: default_performance_item(),
        }
    }
}

fn default_regression_item() -> String {
    checklist::REGRESSION_ITEM_ID.to_string()
}

fn default_security_item() -> String {
    checklist::SECURITY_ITEM_ID.to_string()
}

fn default_performance_item() -> String {
    checklist::PERFORMANCE_ITEM_ID.to_string()
}

impl ProjectConfig {
    /// The gate-engine id mapping this config resolves to.
    #[must_use]
    pub fn gate_ids(&self) -> GateIds {
        GateIds {
            regression: self.gate.regression_item.clone(),
            security: self.gate.security_item.clone(),
            performance: self.gate.performance_item.clone(),
        }
    }
}

/// Load `.certo/config.toml`, returning defaults when the file is absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(".certo/config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("read config {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parse config {}", path.display()))
}

/// Write the config back to `.certo/config.toml`.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn save_project_config(project_root: &Path, config: &ProjectConfig) -> Result<()> {
    let path = project_root.join(".certo/config.toml");
    let rendered = toml::to_string_pretty(config).context("serialize config")?;
    std::fs::write(&path, rendered).with_context(|| format!("write config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::{ProjectConfig, load_project_config, save_project_config};
    use crate::checklist;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = load_project_config(dir.path()).expect("load");
        assert_eq!(config.project.name, "");
        assert_eq!(
            config.gate_ids().regression,
            checklist::REGRESSION_ITEM_ID
        );
    }

    #[test]
    fn roundtrip_preserves_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join(".certo")).expect("mkdir");

        let mut config = ProjectConfig::default();
        config.project.name = "router-fw-2.1".to_string();
        config.gate.security_item = "exec-pentest".to_string();
        save_project_config(dir.path(), &config).expect("save");

        let loaded = load_project_config(dir.path()).expect("load");
        assert_eq!(loaded.project.name, "router-fw-2.1");
        assert_eq!(loaded.gate_ids().security, "exec-pentest");
        assert_eq!(
            loaded.gate_ids().performance,
            checklist::PERFORMANCE_ITEM_ID
        );
    }

    #[test]
    fn partial_file_fills_missing_sections() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join(".certo")).expect("mkdir");
        std::fs::write(
            dir.path().join(".certo/config.toml"),
            "[project]\nname = \"switch-cert\"\n",
        )
        .expect("write");

        let loaded = load_project_config(dir.path()).expect("load");
        assert_eq!(loaded.project.name, "switch-cert");
        assert_eq!(
            loaded.gate_ids().regression,
            checklist::REGRESSION_ITEM_ID
        );
    }

    #[test]
    fn malformed_file_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join(".certo")).expect("mkdir");
        std::fs::write(dir.path().join(".certo/config.toml"), "[project\n").expect("write");

        assert!(load_project_config(dir.path()).is_err());
    }
}

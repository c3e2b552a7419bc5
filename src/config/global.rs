//! Global (user-wide) configuration, loaded via the `config` crate layered
//! over TOML + a `WORKSTACK_`-prefixed environment override, mirroring the
//! teacher's `config.rs` pattern.

use config::{Config, ConfigError, File};
use etcetera::base_strategy::{BaseStrategy, choose_base_strategy};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Rebase defaults nested under `[rebase]` in the global config (§6).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RebaseConfig {
    #[serde(default)]
    pub use_stacks: bool,
    #[serde(default)]
    pub auto_test: bool,
    #[serde(default)]
    pub preserve_stacks: bool,
    #[serde(default = "default_conflict_tool")]
    pub conflict_tool: String,
    #[serde(default = "default_stack_location")]
    pub stack_location: String,
}

fn default_conflict_tool() -> String {
    "vimdiff".to_string()
}

fn default_stack_location() -> String {
    ".rebase-stack".to_string()
}

impl Default for RebaseConfig {
    fn default() -> Self {
        Self {
            use_stacks: false,
            auto_test: false,
            preserve_stacks: false,
            conflict_tool: default_conflict_tool(),
            stack_location: default_stack_location(),
        }
    }
}

/// User-wide configuration (§3, §6). Location: a platform config directory
/// (e.g. `~/.config/workstack/config.toml` on Linux), overridable by
/// `WORKSTACK_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GlobalConfig {
    pub workstacks_root: PathBuf,
    #[serde(default)]
    pub use_graphite: bool,
    #[serde(default = "default_true")]
    pub show_pr_info: bool,
    #[serde(default)]
    pub show_pr_checks: bool,
    #[serde(default)]
    pub shell_setup_complete: bool,
    #[serde(default)]
    pub rebase: RebaseConfig,
}

fn default_true() -> bool {
    true
}

impl Default for GlobalConfig {
    fn default() -> Self {
        let workstacks_root = home::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("worktrees");
        Self {
            workstacks_root,
            use_graphite: false,
            show_pr_info: true,
            show_pr_checks: false,
            shell_setup_complete: false,
            rebase: RebaseConfig::default(),
        }
    }
}

/// Platform-standard path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    let strategy = choose_base_strategy().ok()?;
    Some(strategy.config_dir().join("workstack").join("config.toml"))
}

impl GlobalConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let mut builder = Config::builder()
            .set_default(
                "workstacks_root",
                defaults.workstacks_root.to_string_lossy().into_owned(),
            )?
            .set_default("use_graphite", defaults.use_graphite)?
            .set_default("show_pr_info", defaults.show_pr_info)?
            .set_default("show_pr_checks", defaults.show_pr_checks)?
            .set_default("shell_setup_complete", defaults.shell_setup_complete)?
            .set_default("rebase.use_stacks", defaults.rebase.use_stacks)?
            .set_default("rebase.auto_test", defaults.rebase.auto_test)?
            .set_default("rebase.preserve_stacks", defaults.rebase.preserve_stacks)?
            .set_default("rebase.conflict_tool", defaults.rebase.conflict_tool)?
            .set_default("rebase.stack_location", defaults.rebase.stack_location)?;

        if let Some(path) = global_config_path()
            && path.exists()
        {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(config::Environment::with_prefix("WORKSTACK").separator("_"));

        builder.build()?.try_deserialize()
    }

    pub fn exists() -> bool {
        global_config_path().is_some_and(|p| p.exists())
    }

    /// Read-modify-write the config file via `toml_edit`, so that comments
    /// and formatting a user hand-edited into `config.toml` survive a `ws
    /// config set` of an unrelated key (§6 "Persisted state").
    pub fn save(&self) -> std::io::Result<()> {
        let path = global_config_path().ok_or_else(|| {
            std::io::Error::other("could not determine global config path")
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let existing = std::fs::read_to_string(&path).unwrap_or_default();
        let mut doc: toml_edit::DocumentMut = existing
            .parse()
            .map_err(|e| std::io::Error::other(format!("existing config is not valid TOML: {e}")))?;

        doc["workstacks_root"] = toml_edit::value(self.workstacks_root.to_string_lossy().into_owned());
        doc["use_graphite"] = toml_edit::value(self.use_graphite);
        doc["show_pr_info"] = toml_edit::value(self.show_pr_info);
        doc["show_pr_checks"] = toml_edit::value(self.show_pr_checks);
        doc["shell_setup_complete"] = toml_edit::value(self.shell_setup_complete);

        if doc["rebase"].as_table().is_none() {
            doc["rebase"] = toml_edit::table();
        }
        doc["rebase"]["use_stacks"] = toml_edit::value(self.rebase.use_stacks);
        doc["rebase"]["auto_test"] = toml_edit::value(self.rebase.auto_test);
        doc["rebase"]["preserve_stacks"] = toml_edit::value(self.rebase.preserve_stacks);
        doc["rebase"]["conflict_tool"] = toml_edit::value(self.rebase.conflict_tool.clone());
        doc["rebase"]["stack_location"] = toml_edit::value(self.rebase.stack_location.clone());

        std::fs::write(path, doc.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_show_pr_info_is_true() {
        assert!(GlobalConfig::default().show_pr_info);
    }

    #[test]
    fn test_rebase_defaults() {
        let r = RebaseConfig::default();
        assert_eq!(r.conflict_tool, "vimdiff");
        assert_eq!(r.stack_location, ".rebase-stack");
    }
}

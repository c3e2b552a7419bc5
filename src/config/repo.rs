//! Per-repository configuration (§3, §6), loaded directly via `toml`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// `[post_create]` table: shell to run commands in, and the commands
/// themselves, executed sequentially with `cwd = <new worktree>` (§4.D step 9).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PostCreateConfig {
    #[serde(default = "default_shell")]
    pub shell: String,
    #[serde(default)]
    pub commands: Vec<String>,
}

fn default_shell() -> String {
    "bash".to_string()
}

/// Per-repository config (§3, §6): `env` mapping and `post_create` hook.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RepoConfig {
    #[serde(default)]
    pub env: IndexMap<String, String>,
    #[serde(default)]
    pub post_create: Option<PostCreateConfig>,
}

impl RepoConfig {
    /// Load from `workstacks_root/<repo_name>/config.toml`, or, if present,
    /// `<repo_root>/.config/wt.toml` (written by `init --repo`).
    pub fn load(path: &Path) -> anyhow::Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)?;
        let config: RepoConfig = toml::from_str(&contents)?;
        Ok(Some(config))
    }

    /// Render the `.env` file contents for a new or relocated worktree
    /// (§4.D ".env rendering"). Prepends the three well-known variables.
    pub fn render_env(&self, worktree_path: &Path, repo_root: &Path, name: &str) -> String {
        let mut lines = Vec::new();
        lines.push(format!(
            "WORKTREE_PATH=\"{}\"",
            worktree_path.display()
        ));
        lines.push(format!("WORKTREE_NAME=\"{name}\""));
        lines.push(format!("REPO_ROOT=\"{}\"", repo_root.display()));

        for (key, template) in &self.env {
            let value = template
                .replace("{worktree_path}", &worktree_path.display().to_string())
                .replace("{repo_root}", &repo_root.display().to_string())
                .replace("{name}", name);
            lines.push(format!("{key}=\"{value}\""));
        }

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

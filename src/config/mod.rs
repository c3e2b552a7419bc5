//! Configuration (§3 "Config (three scopes)"): global, repo, and runtime.

mod global;
mod repo;

pub use global::{GlobalConfig, RebaseConfig, global_config_path};
pub use repo::{PostCreateConfig, RepoConfig};

/// Runtime (in-memory) config: just the `dry_run` flag (§3).
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeConfig {
    pub dry_run: bool,
}

//! Shell detection helpers used by the `init` flow (§1 "Out of scope": the
//! init flow itself, and editing a shell startup file, are specified only at
//! their interface — this module supplies that interface).
//!
//! Full shell wrapper script generation and completion installation are the
//! external dispatcher's concern (§1), not redesigned here.

use std::path::PathBuf;

/// Supported shells for the `init --shell` integration line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Shell {
    Bash,
    Fish,
    Zsh,
}

impl Shell {
    /// Standard rc file for this shell, relative to `home`.
    pub fn rc_file(&self, home: &std::path::Path) -> PathBuf {
        match self {
            Self::Bash => home.join(".bashrc"),
            Self::Zsh => std::env::var("ZDOTDIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| home.to_path_buf())
                .join(".zshrc"),
            Self::Fish => home.join(".config").join("fish").join("config.fish"),
        }
    }

    /// The line appended to the rc file by `init --shell` (§1, §6), guarded
    /// so it's a no-op when the binary isn't on PATH.
    pub fn config_line(&self, cmd_prefix: &str) -> String {
        match self {
            Self::Bash | Self::Zsh => format!(
                "if command -v {cmd_prefix} >/dev/null 2>&1; then eval \"$(command {cmd_prefix} init --shell-hook {self})\"; fi"
            ),
            Self::Fish => format!(
                "if type -q {cmd_prefix}; command {cmd_prefix} init --shell-hook {self} | source; end"
            ),
        }
    }
}

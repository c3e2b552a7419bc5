//! WorkstackContext (§4.H): the single immutable bundle every command handler
//! is given. Construction is the only place that chooses between real and
//! dry-run-decorated Operations Layer implementations.

use std::sync::Arc;

use crate::ops::{
    DryRunGlobalConfigOps, DryRunShellOps, DryRunStackedDiffOps, DryRunVcsOps, GlobalConfigOps,
    PrHostOps, RealGlobalConfigOps, RealPrHostOps, RealShellOps, RealStackedDiffOps, RealVcsOps,
    ShellOps, StackedDiffOps, VcsOps,
};

/// Everything a command handler needs: the five Operations Layer ports plus
/// the runtime flag that selected them. Nothing above this layer is aware of
/// `dry_run` directly — it only ever calls through `vcs`/`pr_host`/`stacked`/
/// `global_config`/`shell`.
///
/// Ports are `Arc`-shared rather than `Box`-owned so the status pipeline
/// (§4.F) can clone them into detached, independently-cancellable collector
/// threads without `WorkstackContext` itself needing a `'static` lifetime.
#[derive(Clone)]
pub struct WorkstackContext {
    pub vcs: Arc<dyn VcsOps>,
    pub pr_host: Arc<dyn PrHostOps>,
    pub stacked: Arc<dyn StackedDiffOps>,
    pub global_config: Arc<dyn GlobalConfigOps>,
    pub shell: Arc<dyn ShellOps>,
    pub dry_run: bool,
}

/// Build the context for a CLI invocation. `PrHostOps` has no mutating
/// methods (§4.A), so it never needs a dry-run decorator.
pub fn create_context(dry_run: bool) -> WorkstackContext {
    if dry_run {
        WorkstackContext {
            vcs: Arc::new(DryRunVcsOps::new(RealVcsOps)),
            pr_host: Arc::new(RealPrHostOps),
            stacked: Arc::new(DryRunStackedDiffOps::new(RealStackedDiffOps)),
            global_config: Arc::new(DryRunGlobalConfigOps::new(RealGlobalConfigOps)),
            shell: Arc::new(DryRunShellOps::new(RealShellOps)),
            dry_run: true,
        }
    } else {
        WorkstackContext {
            vcs: Arc::new(RealVcsOps),
            pr_host: Arc::new(RealPrHostOps),
            stacked: Arc::new(RealStackedDiffOps),
            global_config: Arc::new(RealGlobalConfigOps),
            shell: Arc::new(RealShellOps),
            dry_run: false,
        }
    }
}

//! Operations Abstraction Layer (§4.A).
//!
//! Every side-effecting interaction is accessed through one of five small,
//! substitutable interfaces. `dry_run` is implemented exclusively by
//! choosing decorator implementations at context construction (§4.H) — no
//! component above this layer is aware of it.

mod dryrun;
#[cfg(test)]
pub mod fakes;
mod real;
mod traits;

pub use dryrun::{DryRunGlobalConfigOps, DryRunShellOps, DryRunStackedDiffOps, DryRunVcsOps};
pub use real::{RealGlobalConfigOps, RealPrHostOps, RealShellOps, RealStackedDiffOps, RealVcsOps};
pub use traits::*;

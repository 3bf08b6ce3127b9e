//! Application-level orchestration.
//!
//! This module owns request dispatch (the controller task), the per-surface stale
//! response guard, and post-generation processing such as record building and
//! exports. UI/CLI layers call into this module to keep responsibilities separated.

mod controller;
mod coordinator;
mod post_process;

pub(crate) use controller::{run_controller, UiCommand};
pub(crate) use coordinator::{RequestCoordinator, Resolution};
pub(crate) use post_process::{build_record, process_generation, ExportTargets};

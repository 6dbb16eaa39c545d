//! Project structure model for Orbit.
//!
//! This crate owns the data the dependency caches are computed from:
//! - modules with their ordered order entries (module, library and SDK dependencies)
//! - libraries (jar and klib roots) and SDKs
//! - target platforms and their compatibility rules
//! - the modification tracker and change notifications that invalidate derived caches

mod descriptor;
mod model;
mod platform;
mod project;

pub use descriptor::{
    DependencyDescriptor, KlibDescriptor, LibraryDescriptor, LibraryRootDescriptor,
    ModuleDescriptor, ProjectDescriptor, ProjectError, SdkDescriptor,
};
pub use model::*;
pub use platform::{PlatformParseError, SimplePlatform, TargetPlatform};
pub use project::{
    ModificationTracker, Project, ProjectSnapshot, WorkspaceModelChange, WorkspaceModelListener,
};

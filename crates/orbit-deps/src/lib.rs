//! Library dependency caches for an Orbit project.
//!
//! The project model only knows which modules use which libraries. A library's own
//! dependencies are approximated by the libraries and SDKs used together with it:
//! - [`LibraryUsageIndex`] finds the modules declaring a library
//! - [`ModuleDependencies`] are collected per module by walking its order entries
//! - [`LibraryDependenciesCache`] aggregates them and applies the platform filters
//!
//! Every table is tied to the project generation and dropped when the project changes.

mod cache;
mod candidate;
mod error;
pub mod filter;
mod library_info;
mod memo;
mod module_deps;
mod platform_cache;
mod usage_index;

pub use cache::{LibraryDependencies, LibraryDependenciesCache};
pub use candidate::{KlibAttributes, LibraryDependencyCandidate};
pub use error::DepsError;
pub use filter::{
    DefaultLibraryDependenciesFilter, LibraryDependenciesFilter,
    SharedNativeLibraryToNativeInteropFallbackDependenciesFilter,
};
pub use library_info::{
    can_depend_on, LibraryInfo, LibraryInfoCache, SdkInfo, NATIVE_STDLIB_UNIQUE_NAME,
};
pub use module_deps::ModuleDependencies;
pub use platform_cache::ModulePlatformCache;
pub use usage_index::LibraryUsageIndex;

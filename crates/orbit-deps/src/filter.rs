//! Platform filters applied to the candidates collected for a library.

use std::collections::BTreeSet;

use indexmap::IndexSet;
use orbit_project::{SimplePlatform, TargetPlatform};

use crate::LibraryDependencyCandidate;

pub type Candidates = IndexSet<LibraryDependencyCandidate>;

/// Selects, for a library compiled for `platform`, which candidates it may depend on.
pub trait LibraryDependenciesFilter {
    fn filter(&self, platform: &TargetPlatform, candidates: &Candidates) -> Candidates;

    /// Candidates accepted by either filter; `self`'s picks come first.
    fn union<F>(self, other: F) -> Union<Self, F>
    where
        Self: Sized,
        F: LibraryDependenciesFilter,
    {
        Union {
            first: self,
            second: other,
        }
    }
}

/// Keeps candidates whose platform covers every component of the target platform.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLibraryDependenciesFilter;

impl LibraryDependenciesFilter for DefaultLibraryDependenciesFilter {
    fn filter(&self, platform: &TargetPlatform, candidates: &Candidates) -> Candidates {
        candidates
            .iter()
            .filter(|candidate| candidate.platform().is_superset_of(platform))
            .cloned()
            .collect()
    }
}

/// Lets shared native libraries see the interop klibs of their individual native targets.
///
/// Such klibs are only built per target, so the default filter would never accept them for a
/// source set shared between several native targets.
#[derive(Debug, Clone, Copy, Default)]
pub struct SharedNativeLibraryToNativeInteropFallbackDependenciesFilter;

impl LibraryDependenciesFilter for SharedNativeLibraryToNativeInteropFallbackDependenciesFilter {
    fn filter(&self, platform: &TargetPlatform, candidates: &Candidates) -> Candidates {
        if !platform.is_shared_native() {
            return Candidates::new();
        }
        let targets: BTreeSet<&SimplePlatform> = platform.components().collect();

        candidates
            .iter()
            .filter(|candidate| candidate.is_native_interop())
            .filter(|candidate| {
                candidate
                    .platform()
                    .single_component()
                    .is_some_and(|target| targets.contains(target))
            })
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Union<A, B> {
    first: A,
    second: B,
}

impl<A, B> LibraryDependenciesFilter for Union<A, B>
where
    A: LibraryDependenciesFilter,
    B: LibraryDependenciesFilter,
{
    fn filter(&self, platform: &TargetPlatform, candidates: &Candidates) -> Candidates {
        let mut out = self.first.filter(platform, candidates);
        out.extend(self.second.filter(platform, candidates));
        out
    }
}

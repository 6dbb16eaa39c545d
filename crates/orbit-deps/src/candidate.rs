use indexmap::IndexMap;
use orbit_project::TargetPlatform;

use crate::LibraryInfo;

/// Klib attributes shared by every info of a klib-backed candidate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KlibAttributes {
    pub unique_name: String,
    pub interop: bool,
}

/// The infos of one library that share a platform, considered together as a dependency.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LibraryDependencyCandidate {
    platform: TargetPlatform,
    libraries: Vec<LibraryInfo>,
    klib: Option<KlibAttributes>,
}

impl LibraryDependencyCandidate {
    /// Groups the infos of a single library by platform, in first-seen order.
    pub fn from_library_infos(infos: &[LibraryInfo]) -> Vec<Self> {
        let mut by_platform: IndexMap<&TargetPlatform, Vec<LibraryInfo>> = IndexMap::new();
        for info in infos {
            by_platform
                .entry(info.platform())
                .or_default()
                .push(info.clone());
        }

        by_platform
            .into_iter()
            .map(|(platform, libraries)| {
                let klib = if libraries.iter().all(|info| info.klib().is_some()) {
                    libraries[0].klib().map(|klib| KlibAttributes {
                        unique_name: klib.unique_name.clone(),
                        interop: klib.interop,
                    })
                } else {
                    None
                };
                Self {
                    platform: platform.clone(),
                    libraries,
                    klib,
                }
            })
            .collect()
    }

    pub fn platform(&self) -> &TargetPlatform {
        &self.platform
    }

    pub fn libraries(&self) -> &[LibraryInfo] {
        &self.libraries
    }

    pub fn klib(&self) -> Option<&KlibAttributes> {
        self.klib.as_ref()
    }

    pub fn is_native_interop(&self) -> bool {
        self.platform.is_native() && self.klib.as_ref().is_some_and(|klib| klib.interop)
    }

    pub fn into_libraries(self) -> Vec<LibraryInfo> {
        self.libraries
    }
}

use std::collections::HashMap;

use indexmap::IndexSet;
use orbit_project::{LibraryId, ModuleId, OrderEntry, ProjectSnapshot};

use crate::{can_depend_on, LibraryInfo, ModulePlatformCache};

/// Which loaded modules declare which library, built from one project snapshot.
#[derive(Debug)]
pub struct LibraryUsageIndex {
    generation: u64,
    modules_by_library: HashMap<LibraryId, IndexSet<ModuleId>>,
}

impl LibraryUsageIndex {
    pub fn build(snapshot: &ProjectSnapshot) -> Self {
        let mut modules_by_library: HashMap<LibraryId, IndexSet<ModuleId>> = HashMap::new();
        for (id, module) in snapshot.loaded_modules() {
            for entry in &module.order_entries {
                if let OrderEntry::Library { library, .. } = entry {
                    modules_by_library.entry(*library).or_default().insert(id);
                }
            }
        }

        tracing::debug!(
            target: "orbit.deps",
            generation = snapshot.generation(),
            libraries = modules_by_library.len(),
            "built library usage index"
        );

        Self {
            generation: snapshot.generation(),
            modules_by_library,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Modules declaring `library`, in project order.
    pub fn modules_declaring(&self, library: LibraryId) -> impl Iterator<Item = ModuleId> + '_ {
        self.modules_by_library
            .get(&library)
            .into_iter()
            .flatten()
            .copied()
    }

    /// Modules that declare the library of `info` and have a source set able to see it.
    ///
    /// `snapshot` must be the snapshot this index was built from.
    pub fn modules_library_is_used_in<'a>(
        &'a self,
        snapshot: &'a ProjectSnapshot,
        platforms: &'a ModulePlatformCache,
        info: &'a LibraryInfo,
    ) -> impl Iterator<Item = ModuleId> + 'a {
        debug_assert_eq!(snapshot.generation(), self.generation);
        self.modules_declaring(info.library()).filter(move |&id| {
            let Some(module) = snapshot.module(id) else {
                return false;
            };
            if module.source_sets.is_empty() {
                return false;
            }
            platforms
                .platform(snapshot, id)
                .is_ok_and(|platform| can_depend_on(&platform, info, module.hmpp_enabled))
        })
    }
}

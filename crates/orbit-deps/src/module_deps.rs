use std::collections::HashSet;

use indexmap::IndexSet;
use orbit_project::{DependencyScope, ModuleId, OrderEntry, ProjectSnapshot};

use crate::{DepsError, LibraryDependencyCandidate, LibraryInfoCache, SdkInfo};

/// Libraries and SDKs reachable from one module, in traversal order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleDependencies {
    pub libraries: IndexSet<LibraryDependencyCandidate>,
    pub sdks: IndexSet<SdkInfo>,
}

struct Frame {
    module: ModuleId,
    next_entry: usize,
}

/// Walks the order entries of `root` and everything it depends on, depth first.
///
/// Each module is entered once. Entries pointing at unloaded or disposed modules are skipped,
/// and so are test-scoped and SDK entries of modules reached transitively.
pub(crate) fn collect_module_dependencies(
    snapshot: &ProjectSnapshot,
    library_infos: &LibraryInfoCache,
    root: ModuleId,
) -> Result<ModuleDependencies, DepsError> {
    let root_module = snapshot.module(root).ok_or(DepsError::UnknownModule(root))?;
    if root_module.is_disposed() {
        return Err(DepsError::ModuleDisposed {
            name: root_module.name.clone(),
        });
    }

    let mut out = ModuleDependencies::default();
    let mut visited = HashSet::from([root]);
    let mut stack = vec![Frame {
        module: root,
        next_entry: 0,
    }];

    while let Some(frame) = stack.last_mut() {
        let owner = frame.module;
        let Some(entry) = snapshot
            .module(owner)
            .and_then(|module| module.order_entries.get(frame.next_entry))
        else {
            stack.pop();
            continue;
        };
        frame.next_entry += 1;

        let transitive = owner != root;
        if transitive && entry.scope() == Some(DependencyScope::Test) {
            continue;
        }

        match entry {
            OrderEntry::ModuleSource => {}
            OrderEntry::Module { module, .. } => {
                let loaded = snapshot.module(*module).is_some_and(|m| m.is_loaded());
                if loaded && visited.insert(*module) {
                    stack.push(Frame {
                        module: *module,
                        next_entry: 0,
                    });
                }
            }
            OrderEntry::Library { library, .. } => {
                let infos = library_infos.get(snapshot, *library);
                out.libraries
                    .extend(LibraryDependencyCandidate::from_library_infos(&infos));
            }
            OrderEntry::Sdk { sdk } => {
                if transitive {
                    continue;
                }
                if let Some(found) = snapshot.sdk(*sdk) {
                    out.sdks.insert(SdkInfo {
                        sdk: *sdk,
                        name: found.name.clone(),
                    });
                }
            }
        }
    }

    Ok(out)
}

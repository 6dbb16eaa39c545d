use std::collections::HashMap;

use orbit_project::{
    ModuleId, ProjectSnapshot, TargetPlatform, WorkspaceModelChange, WorkspaceModelListener,
};
use parking_lot::RwLock;

use crate::DepsError;

/// Per-module cache of the effective module platform.
///
/// Unlike the dependency tables this cache is invalidated per key: a workspace change only
/// evicts the modules it reports as changed. Changes it did not observe (a generation gap) and
/// project-wide changes drop the whole table.
#[derive(Debug)]
pub struct ModulePlatformCache {
    state: RwLock<PlatformState>,
}

#[derive(Debug)]
struct PlatformState {
    generation: u64,
    platforms: HashMap<ModuleId, TargetPlatform>,
}

impl ModulePlatformCache {
    pub fn new(generation: u64) -> Self {
        Self {
            state: RwLock::new(PlatformState {
                generation,
                platforms: HashMap::new(),
            }),
        }
    }

    pub fn platform(
        &self,
        snapshot: &ProjectSnapshot,
        id: ModuleId,
    ) -> Result<TargetPlatform, DepsError> {
        let module = snapshot.module(id).ok_or(DepsError::UnknownModule(id))?;
        if module.is_disposed() {
            return Err(DepsError::ModuleDisposed {
                name: module.name.clone(),
            });
        }

        let generation = snapshot.generation();
        {
            let state = self.state.read();
            if state.generation == generation {
                if let Some(platform) = state.platforms.get(&id) {
                    return Ok(platform.clone());
                }
            }
        }

        let platform = snapshot.effective_platform(module);

        let mut state = self.state.write();
        if state.generation < generation {
            // Changes arrived without a notification yet; any entry may be stale.
            state.platforms.clear();
            state.generation = generation;
        }
        if state.generation == generation {
            state.platforms.insert(id, platform.clone());
        }
        Ok(platform)
    }

    pub fn len(&self) -> usize {
        self.state.read().platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl WorkspaceModelListener for ModulePlatformCache {
    fn workspace_model_changed(&self, change: &WorkspaceModelChange) {
        let mut state = self.state.write();
        let gap = change.generation > state.generation + 1;
        if gap || change.libraries_changed {
            state.platforms.clear();
        } else {
            for module in &change.changed_modules {
                state.platforms.remove(module);
            }
        }
        state.generation = state.generation.max(change.generation);

        tracing::trace!(
            target: "orbit.deps",
            generation = state.generation,
            cached = state.platforms.len(),
            "module platform cache updated"
        );
    }
}

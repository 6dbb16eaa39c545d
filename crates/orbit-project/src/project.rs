use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use crate::{ModuleId, ProjectModel};

/// Monotonic counter bumped on every change to the project structure.
///
/// Caches record the count they were computed at and treat any other value as "everything is
/// stale".
#[derive(Debug, Default)]
pub struct ModificationTracker {
    count: AtomicU64,
}

impl ModificationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn modification_count(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }

    fn increment(&self) -> u64 {
        self.count.fetch_add(1, Ordering::AcqRel) + 1
    }
}

/// An immutable view of the project model tagged with the generation it belongs to.
#[derive(Debug, Clone)]
pub struct ProjectSnapshot {
    model: Arc<ProjectModel>,
    generation: u64,
}

impl ProjectSnapshot {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn model(&self) -> &Arc<ProjectModel> {
        &self.model
    }
}

impl Deref for ProjectSnapshot {
    type Target = ProjectModel;

    fn deref(&self) -> &Self::Target {
        &self.model
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceModelChange {
    /// Generation of the model after the change.
    pub generation: u64,
    /// Modules whose definition differs between the old and new model (including added ones).
    pub changed_modules: Vec<ModuleId>,
    pub libraries_changed: bool,
}

impl WorkspaceModelChange {
    pub fn is_empty(&self) -> bool {
        self.changed_modules.is_empty() && !self.libraries_changed
    }
}

/// Receives workspace model change notifications from a [`Project`].
pub trait WorkspaceModelListener: Send + Sync {
    fn workspace_model_changed(&self, change: &WorkspaceModelChange);
}

/// The mutable owner of a project's structure.
///
/// Readers take cheap [`ProjectSnapshot`]s; writers go through [`Project::update`], which swaps
/// in a new model, bumps the [`ModificationTracker`] and notifies listeners.
pub struct Project {
    name: String,
    state: RwLock<ProjectSnapshot>,
    tracker: ModificationTracker,
    listeners: Mutex<Vec<Weak<dyn WorkspaceModelListener>>>,
}

impl std::fmt::Debug for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Project")
            .field("name", &self.name)
            .field("generation", &self.tracker.modification_count())
            .finish_non_exhaustive()
    }
}

impl Project {
    pub fn new(name: impl Into<String>, model: ProjectModel) -> Self {
        let tracker = ModificationTracker::new();
        let generation = tracker.modification_count();
        Self {
            name: name.into(),
            state: RwLock::new(ProjectSnapshot {
                model: Arc::new(model),
                generation,
            }),
            tracker,
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn snapshot(&self) -> ProjectSnapshot {
        self.state.read().clone()
    }

    pub fn modification_tracker(&self) -> &ModificationTracker {
        &self.tracker
    }

    /// Registers a listener. Only a weak reference is kept; dropped listeners are pruned on the
    /// next notification.
    pub fn subscribe<L>(&self, listener: &Arc<L>)
    where
        L: WorkspaceModelListener + 'static,
    {
        let listener: Arc<dyn WorkspaceModelListener> = listener.clone();
        self.listeners.lock().push(Arc::downgrade(&listener));
    }

    /// Applies `f` to a copy of the current model and publishes the result as a new generation.
    ///
    /// Listeners run after the new snapshot is visible, outside of the model lock.
    pub fn update<R>(&self, f: impl FnOnce(&mut ProjectModel) -> R) -> R {
        let (result, change) = {
            let mut state = self.state.write();
            let mut model = ProjectModel::clone(&state.model);
            let result = f(&mut model);

            let changed_modules = state.model.changed_modules(&model);
            let libraries_changed = state.model.libraries_or_sdks_differ(&model);
            let generation = self.tracker.increment();
            *state = ProjectSnapshot {
                model: Arc::new(model),
                generation,
            };

            (
                result,
                WorkspaceModelChange {
                    generation,
                    changed_modules,
                    libraries_changed,
                },
            )
        };

        tracing::debug!(
            target: "orbit.project",
            project = %self.name,
            generation = change.generation,
            changed_modules = change.changed_modules.len(),
            libraries_changed = change.libraries_changed,
            "workspace model updated"
        );

        self.notify(&change);
        result
    }

    fn notify(&self, change: &WorkspaceModelChange) {
        let listeners: Vec<Arc<dyn WorkspaceModelListener>> = {
            let mut listeners = self.listeners.lock();
            listeners.retain(|listener| listener.strong_count() > 0);
            listeners.iter().filter_map(Weak::upgrade).collect()
        };

        for listener in listeners {
            listener.workspace_model_changed(change);
        }
    }
}

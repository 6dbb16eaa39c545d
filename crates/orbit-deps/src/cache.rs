use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexSet;
use orbit_config::DependenciesConfig;
use orbit_project::{
    LibraryId, ModuleId, Project, ProjectSnapshot, TargetPlatform, WorkspaceModelChange,
    WorkspaceModelListener,
};
use orbit_scheduler::{check_cancelled, CancellationToken, RequestContext};
use parking_lot::RwLock;

use crate::filter::{
    Candidates, DefaultLibraryDependenciesFilter, LibraryDependenciesFilter,
    SharedNativeLibraryToNativeInteropFallbackDependenciesFilter,
};
use crate::memo::MemoTable;
use crate::module_deps::collect_module_dependencies;
use crate::{
    DepsError, LibraryInfo, LibraryInfoCache, LibraryUsageIndex, ModuleDependencies,
    ModulePlatformCache, SdkInfo,
};

/// Libraries and SDKs a library is used together with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryDependencies {
    pub libraries: Vec<LibraryInfo>,
    pub sdks: Vec<SdkInfo>,
}

/// Per-project memoizing cache of library dependencies.
///
/// A library has no dependency information of its own, so it is approximated by everything the
/// modules using it depend on, restricted to what its platform may see. Results are memoized
/// until the project structure changes; the tables are cleared on every workspace model change
/// and, independently, compared against the project generation at read time.
pub struct LibraryDependenciesCache {
    project: Arc<Project>,
    config: DependenciesConfig,
    library_infos: LibraryInfoCache,
    platforms: Arc<ModulePlatformCache>,
    usage_index: RwLock<Option<Arc<LibraryUsageIndex>>>,
    library_dependencies: MemoTable<LibraryInfo, Arc<LibraryDependencies>>,
    module_dependencies: MemoTable<ModuleId, Arc<ModuleDependencies>>,
}

impl std::fmt::Debug for LibraryDependenciesCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryDependenciesCache")
            .field("project", &self.project.name())
            .field("libraries", &self.library_dependencies.len())
            .field("modules", &self.module_dependencies.len())
            .finish_non_exhaustive()
    }
}

impl LibraryDependenciesCache {
    /// Creates the cache and subscribes it (and its module platform cache) to `project`.
    pub fn new(project: Arc<Project>, config: DependenciesConfig) -> Arc<Self> {
        let generation = project.modification_tracker().modification_count();
        let platforms = Arc::new(ModulePlatformCache::new(generation));
        let cache = Arc::new(Self {
            project,
            config,
            library_infos: LibraryInfoCache::new(generation),
            platforms,
            usage_index: RwLock::new(None),
            library_dependencies: MemoTable::new(generation),
            module_dependencies: MemoTable::new(generation),
        });
        cache.project.subscribe(&cache.platforms);
        cache.project.subscribe(&cache);
        cache
    }

    pub fn project(&self) -> &Arc<Project> {
        &self.project
    }

    pub fn config(&self) -> &DependenciesConfig {
        &self.config
    }

    /// The libraries and SDKs `library` is used together with.
    ///
    /// Cancellation is observed between modules; a cancelled computation stores nothing.
    pub fn library_dependencies(
        &self,
        library: &LibraryInfo,
        token: &CancellationToken,
    ) -> Result<Arc<LibraryDependencies>, DepsError> {
        self.library_dependencies_with_context(library, &RequestContext::new(token.clone()))
    }

    /// Like [`Self::library_dependencies`], but also gives up once the context's deadline has
    /// passed. Cached results are returned regardless of the deadline.
    pub fn library_dependencies_with_context(
        &self,
        library: &LibraryInfo,
        ctx: &RequestContext,
    ) -> Result<Arc<LibraryDependencies>, DepsError> {
        let snapshot = self.project.snapshot();
        let generation = snapshot.generation();
        if let Some(hit) = self.library_dependencies.get(generation, library) {
            tracing::trace!(
                target: "orbit.deps",
                library = library.name(),
                "library dependencies cache hit"
            );
            return Ok(hit);
        }

        let started = Instant::now();
        let computed = Arc::new(self.compute_library_dependencies(&snapshot, library, ctx)?);
        tracing::debug!(
            target: "orbit.deps",
            library = library.name(),
            platform = %library.platform(),
            generation,
            libraries = computed.libraries.len(),
            sdks = computed.sdks.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "computed library dependencies"
        );
        Ok(self.store(&self.library_dependencies, generation, library.clone(), computed))
    }

    /// Libraries and SDKs reachable from `module`, unfiltered.
    pub fn module_dependencies(
        &self,
        module: ModuleId,
        token: &CancellationToken,
    ) -> Result<Arc<ModuleDependencies>, DepsError> {
        check_cancelled(token)?;
        let snapshot = self.project.snapshot();
        self.module_dependencies_at(&snapshot, module)
    }

    /// The [`LibraryInfo`]s a project library is split into.
    pub fn library_infos(&self, library: LibraryId) -> Result<Arc<[LibraryInfo]>, DepsError> {
        let snapshot = self.project.snapshot();
        if snapshot.library(library).is_none() {
            return Err(DepsError::UnknownLibrary(library));
        }
        Ok(self.library_infos.get(&snapshot, library))
    }

    pub fn module_platform(&self, module: ModuleId) -> Result<TargetPlatform, DepsError> {
        self.platforms.platform(&self.project.snapshot(), module)
    }

    fn compute_library_dependencies(
        &self,
        snapshot: &ProjectSnapshot,
        library: &LibraryInfo,
        ctx: &RequestContext,
    ) -> Result<LibraryDependencies, DepsError> {
        ctx.check()?;
        let index = self.usage_index(snapshot);

        let mut candidates = Candidates::new();
        let mut sdks = IndexSet::new();
        for module in index.modules_library_is_used_in(snapshot, &self.platforms, library) {
            ctx.check()?;
            let deps = self.module_dependencies_at(snapshot, module)?;
            candidates.extend(deps.libraries.iter().cloned());
            sdks.extend(deps.sdks.iter().cloned());
        }

        let candidates = self.filter_for_builtins(library, candidates);
        let filter = DefaultLibraryDependenciesFilter
            .union(SharedNativeLibraryToNativeInteropFallbackDependenciesFilter);
        let libraries = filter
            .filter(library.platform(), &candidates)
            .into_iter()
            .flat_map(|candidate| candidate.into_libraries())
            .collect();

        Ok(LibraryDependencies {
            libraries,
            sdks: sdks.into_iter().collect(),
        })
    }

    /// When built-ins come from module dependencies, the standard library has to be resolved
    /// together with the SDK, so it may only depend on other core libraries.
    fn filter_for_builtins(&self, library: &LibraryInfo, candidates: Candidates) -> Candidates {
        let prefixes = &self.config.core_library_prefixes;
        if self.config.builtins.is_from_class_loader() || !library.is_core_kotlin_library(prefixes) {
            return candidates;
        }
        candidates
            .into_iter()
            .filter(|candidate| {
                candidate
                    .libraries()
                    .iter()
                    .any(|info| info.is_core_kotlin_library(prefixes))
            })
            .collect()
    }

    fn module_dependencies_at(
        &self,
        snapshot: &ProjectSnapshot,
        module: ModuleId,
    ) -> Result<Arc<ModuleDependencies>, DepsError> {
        let generation = snapshot.generation();
        if let Some(hit) = self.module_dependencies.get(generation, &module) {
            return Ok(hit);
        }
        let computed = Arc::new(collect_module_dependencies(
            snapshot,
            &self.library_infos,
            module,
        )?);
        Ok(self.store(&self.module_dependencies, generation, module, computed))
    }

    fn usage_index(&self, snapshot: &ProjectSnapshot) -> Arc<LibraryUsageIndex> {
        let generation = snapshot.generation();
        if let Some(index) = self.usage_index.read().as_ref() {
            if index.generation() == generation {
                return index.clone();
            }
        }

        let index = Arc::new(LibraryUsageIndex::build(snapshot));
        let mut slot = self.usage_index.write();
        let newer = slot
            .as_ref()
            .is_some_and(|current| current.generation() >= generation);
        if !newer && self.is_current(generation) {
            *slot = Some(index.clone());
        }
        index
    }

    fn store<K, V>(
        &self,
        table: &MemoTable<K, Arc<V>>,
        generation: u64,
        key: K,
        value: Arc<V>,
    ) -> Arc<V>
    where
        K: Eq + std::hash::Hash,
    {
        if !self.is_current(generation) {
            tracing::debug!(
                target: "orbit.deps",
                generation,
                "dropping result computed against an outdated project model"
            );
            return value;
        }
        table.insert(generation, key, value)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.project.modification_tracker().modification_count() == generation
    }
}

impl WorkspaceModelListener for LibraryDependenciesCache {
    fn workspace_model_changed(&self, change: &WorkspaceModelChange) {
        self.library_infos.invalidate(change.generation);
        self.library_dependencies.invalidate(change.generation);
        self.module_dependencies.invalidate(change.generation);
        *self.usage_index.write() = None;

        tracing::debug!(
            target: "orbit.deps",
            project = self.project.name(),
            generation = change.generation,
            "library dependencies cache invalidated"
        );
    }
}

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::TargetPlatform;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u32);

        impl $name {
            #[inline]
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            #[inline]
            pub const fn to_raw(self) -> u32 {
                self.0
            }

            #[inline]
            fn index(self) -> usize {
                self.0 as usize
            }

            fn from_index(index: usize) -> Self {
                Self(u32::try_from(index).expect("project model arena overflow"))
            }
        }
    };
}

arena_id!(
    /// Index of a [`Module`] inside a [`ProjectModel`].
    ModuleId
);
arena_id!(
    /// Index of a [`Library`] inside a [`ProjectModel`].
    LibraryId
);
arena_id!(
    /// Index of an [`Sdk`] inside a [`ProjectModel`].
    SdkId
);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyScope {
    #[default]
    Compile,
    Test,
    Runtime,
    Provided,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceSetKind {
    Main,
    Test,
}

/// A module's declared dependency edge.
///
/// `exported` records whether the edge is re-exported to dependents. It is kept for
/// descriptor round-trips and reporting; transitive traversal follows every edge regardless.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OrderEntry {
    /// The module's own sources.
    ModuleSource,
    Module {
        module: ModuleId,
        scope: DependencyScope,
        exported: bool,
    },
    Library {
        library: LibraryId,
        scope: DependencyScope,
        exported: bool,
    },
    Sdk {
        sdk: SdkId,
    },
}

impl OrderEntry {
    pub fn module(module: ModuleId) -> Self {
        OrderEntry::Module {
            module,
            scope: DependencyScope::Compile,
            exported: false,
        }
    }

    pub fn library(library: LibraryId) -> Self {
        OrderEntry::Library {
            library,
            scope: DependencyScope::Compile,
            exported: false,
        }
    }

    pub fn sdk(sdk: SdkId) -> Self {
        OrderEntry::Sdk { sdk }
    }

    pub fn with_scope(mut self, new_scope: DependencyScope) -> Self {
        match &mut self {
            OrderEntry::Module { scope, .. } | OrderEntry::Library { scope, .. } => {
                *scope = new_scope;
            }
            OrderEntry::ModuleSource | OrderEntry::Sdk { .. } => {}
        }
        self
    }

    pub fn scope(&self) -> Option<DependencyScope> {
        match self {
            OrderEntry::Module { scope, .. } | OrderEntry::Library { scope, .. } => Some(*scope),
            OrderEntry::ModuleSource | OrderEntry::Sdk { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleState {
    Loaded,
    /// Present in the project configuration but excluded from analysis. Order entries that point
    /// at unloaded modules do not resolve.
    Unloaded,
    /// Removed from the project. The id stays reserved so stale handles can be detected.
    Disposed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub name: String,
    pub state: ModuleState,
    /// Platform configured on the module itself. When unset, the project default applies.
    pub platform: Option<TargetPlatform>,
    pub hmpp_enabled: bool,
    pub source_sets: Vec<SourceSetKind>,
    pub order_entries: Vec<OrderEntry>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: ModuleState::Loaded,
            platform: None,
            hmpp_enabled: false,
            source_sets: vec![SourceSetKind::Main],
            order_entries: vec![OrderEntry::ModuleSource],
        }
    }

    pub fn with_platform(mut self, platform: TargetPlatform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn with_dependency(mut self, entry: OrderEntry) -> Self {
        self.order_entries.push(entry);
        self
    }

    pub fn is_loaded(&self) -> bool {
        self.state == ModuleState::Loaded
    }

    pub fn is_disposed(&self) -> bool {
        self.state == ModuleState::Disposed
    }
}

/// Metadata read from a Kotlin library (`.klib`) manifest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KlibManifest {
    pub unique_name: String,
    pub platform: TargetPlatform,
    /// Generated by cinterop from native headers.
    pub interop: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LibraryRootKind {
    Jar,
    Klib(KlibManifest),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LibraryRoot {
    pub path: PathBuf,
    pub kind: LibraryRootKind,
}

impl LibraryRoot {
    pub fn jar(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: LibraryRootKind::Jar,
        }
    }

    pub fn klib(path: impl Into<PathBuf>, manifest: KlibManifest) -> Self {
        Self {
            path: path.into(),
            kind: LibraryRootKind::Klib(manifest),
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|name| name.to_str())
    }

    pub fn klib_manifest(&self) -> Option<&KlibManifest> {
        match &self.kind {
            LibraryRootKind::Klib(manifest) => Some(manifest),
            LibraryRootKind::Jar => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Library {
    pub name: String,
    pub roots: Vec<LibraryRoot>,
    /// Platform of the library's jar roots. Defaults to JVM; common metadata jars override it.
    pub platform: Option<TargetPlatform>,
    pub disposed: bool,
}

impl Library {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            roots: Vec::new(),
            platform: None,
            disposed: false,
        }
    }

    pub fn with_root(mut self, root: LibraryRoot) -> Self {
        self.roots.push(root);
        self
    }

    pub fn with_platform(mut self, platform: TargetPlatform) -> Self {
        self.platform = Some(platform);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sdk {
    pub name: String,
    pub home: Option<PathBuf>,
    pub version: Option<String>,
}

impl Sdk {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            home: None,
            version: None,
        }
    }

    pub fn home(&self) -> Option<&Path> {
        self.home.as_deref()
    }
}

/// Modules, libraries and SDKs of one project.
///
/// Entries are never removed from the arenas; removal marks them disposed so that ids handed out
/// earlier remain unambiguous.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectModel {
    modules: Vec<Module>,
    libraries: Vec<Library>,
    sdks: Vec<Sdk>,
    pub default_platform: Option<TargetPlatform>,
}

impl ProjectModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_module(&mut self, module: Module) -> ModuleId {
        let id = ModuleId::from_index(self.modules.len());
        self.modules.push(module);
        id
    }

    pub fn add_library(&mut self, library: Library) -> LibraryId {
        let id = LibraryId::from_index(self.libraries.len());
        self.libraries.push(library);
        id
    }

    pub fn add_sdk(&mut self, sdk: Sdk) -> SdkId {
        let id = SdkId::from_index(self.sdks.len());
        self.sdks.push(sdk);
        id
    }

    pub fn module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.get(id.index())
    }

    pub fn module_mut(&mut self, id: ModuleId) -> Option<&mut Module> {
        self.modules.get_mut(id.index())
    }

    pub fn library(&self, id: LibraryId) -> Option<&Library> {
        self.libraries.get(id.index())
    }

    pub fn library_mut(&mut self, id: LibraryId) -> Option<&mut Library> {
        self.libraries.get_mut(id.index())
    }

    pub fn sdk(&self, id: SdkId) -> Option<&Sdk> {
        self.sdks.get(id.index())
    }

    /// All modules, including unloaded and disposed ones.
    pub fn modules(&self) -> impl Iterator<Item = (ModuleId, &Module)> + '_ {
        self.modules
            .iter()
            .enumerate()
            .map(|(idx, module)| (ModuleId::from_index(idx), module))
    }

    pub fn loaded_modules(&self) -> impl Iterator<Item = (ModuleId, &Module)> + '_ {
        self.modules().filter(|(_, module)| module.is_loaded())
    }

    pub fn libraries(&self) -> impl Iterator<Item = (LibraryId, &Library)> + '_ {
        self.libraries
            .iter()
            .enumerate()
            .map(|(idx, library)| (LibraryId::from_index(idx), library))
    }

    pub fn sdks(&self) -> impl Iterator<Item = (SdkId, &Sdk)> + '_ {
        self.sdks
            .iter()
            .enumerate()
            .map(|(idx, sdk)| (SdkId::from_index(idx), sdk))
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn module_by_name(&self, name: &str) -> Option<ModuleId> {
        self.modules()
            .find(|(_, module)| !module.is_disposed() && module.name == name)
            .map(|(id, _)| id)
    }

    pub fn library_by_name(&self, name: &str) -> Option<LibraryId> {
        self.libraries()
            .find(|(_, library)| !library.disposed && library.name == name)
            .map(|(id, _)| id)
    }

    pub fn sdk_by_name(&self, name: &str) -> Option<SdkId> {
        self.sdks()
            .find(|(_, sdk)| sdk.name == name)
            .map(|(id, _)| id)
    }

    /// Marks a module as disposed. Returns `false` if the id is unknown or already disposed.
    pub fn dispose_module(&mut self, id: ModuleId) -> bool {
        match self.module_mut(id) {
            Some(module) if !module.is_disposed() => {
                module.state = ModuleState::Disposed;
                true
            }
            _ => false,
        }
    }

    pub fn dispose_library(&mut self, id: LibraryId) -> bool {
        match self.library_mut(id) {
            Some(library) if !library.disposed => {
                library.disposed = true;
                true
            }
            _ => false,
        }
    }

    /// Effective platform of a module: its own setting, then the project default, then JVM.
    pub fn effective_platform(&self, module: &Module) -> TargetPlatform {
        module
            .platform
            .clone()
            .or_else(|| self.default_platform.clone())
            .unwrap_or_else(TargetPlatform::jvm)
    }

    pub(crate) fn changed_modules(&self, newer: &ProjectModel) -> Vec<ModuleId> {
        let len = self.modules.len().max(newer.modules.len());
        (0..len)
            .filter(|&idx| self.modules.get(idx) != newer.modules.get(idx))
            .map(ModuleId::from_index)
            .collect()
    }

    pub(crate) fn libraries_or_sdks_differ(&self, newer: &ProjectModel) -> bool {
        self.libraries != newer.libraries
            || self.sdks != newer.sdks
            || self.default_platform != newer.default_platform
    }
}

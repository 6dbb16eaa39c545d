use std::hash::{Hash, Hasher};
use std::sync::Arc;

use orbit_project::{
    KlibManifest, LibraryId, LibraryRoot, LibraryRootKind, ProjectModel, ProjectSnapshot, SdkId,
    TargetPlatform,
};

use crate::memo::MemoTable;

/// Unique name of the Kotlin/Native standard library klib.
pub const NATIVE_STDLIB_UNIQUE_NAME: &str = "stdlib";

const KLIB_STDLIB_PREFIX: &str = "org.jetbrains.kotlin:kotlin-stdlib";

/// A library (or one klib root of it) together with the platform it is compiled for.
///
/// Two infos are equal when they describe the same library and the same klib root; the cached
/// name, platform and roots are derived data.
#[derive(Debug, Clone)]
pub struct LibraryInfo {
    library: LibraryId,
    klib_root: Option<usize>,
    name: String,
    platform: TargetPlatform,
    roots: Vec<LibraryRoot>,
}

impl LibraryInfo {
    pub fn library(&self) -> LibraryId {
        self.library
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn platform(&self) -> &TargetPlatform {
        &self.platform
    }

    pub fn roots(&self) -> &[LibraryRoot] {
        &self.roots
    }

    /// Manifest of the klib this info was split from, if any.
    pub fn klib(&self) -> Option<&KlibManifest> {
        self.klib_root?;
        self.roots.first().and_then(LibraryRoot::klib_manifest)
    }

    pub fn is_native_stdlib(&self) -> bool {
        self.klib()
            .is_some_and(|klib| klib.unique_name == NATIVE_STDLIB_UNIQUE_NAME)
    }

    /// Whether this is the Kotlin standard library (any flavor).
    ///
    /// Jar roots are matched by file name prefix, klib roots by unique name.
    pub fn is_core_kotlin_library(&self, core_prefixes: &[String]) -> bool {
        self.roots.iter().any(|root| match &root.kind {
            LibraryRootKind::Jar => root.file_name().is_some_and(|file_name| {
                core_prefixes
                    .iter()
                    .filter(|prefix| !prefix.is_empty())
                    .any(|prefix| file_name.starts_with(prefix.as_str()))
            }),
            LibraryRootKind::Klib(klib) => {
                klib.unique_name == NATIVE_STDLIB_UNIQUE_NAME
                    || klib.unique_name.starts_with(KLIB_STDLIB_PREFIX)
            }
        })
    }
}

impl PartialEq for LibraryInfo {
    fn eq(&self, other: &Self) -> bool {
        self.library == other.library && self.klib_root == other.klib_root
    }
}

impl Eq for LibraryInfo {}

impl Hash for LibraryInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.library.hash(state);
        self.klib_root.hash(state);
    }
}

/// Whether code of a module compiled for `module_platform` may see `library`.
pub fn can_depend_on(
    module_platform: &TargetPlatform,
    library: &LibraryInfo,
    hmpp_enabled: bool,
) -> bool {
    if module_platform.is_native() && library.is_native_stdlib() {
        return true;
    }
    module_platform.can_depend_on(library.platform(), hmpp_enabled)
}

/// A project SDK referenced from an order entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SdkInfo {
    pub sdk: SdkId,
    pub name: String,
}

/// Splits project libraries into [`LibraryInfo`]s.
///
/// All jar roots of a library share one info (the library's platform override, else JVM). Each
/// klib root becomes its own info carrying the klib's platform. Disposed libraries and
/// libraries without roots produce no infos.
#[derive(Debug)]
pub struct LibraryInfoCache {
    infos: MemoTable<LibraryId, Arc<[LibraryInfo]>>,
}

impl LibraryInfoCache {
    pub fn new(generation: u64) -> Self {
        Self {
            infos: MemoTable::new(generation),
        }
    }

    pub fn get(&self, snapshot: &ProjectSnapshot, library: LibraryId) -> Arc<[LibraryInfo]> {
        let generation = snapshot.generation();
        if let Some(infos) = self.infos.get(generation, &library) {
            return infos;
        }
        let infos: Arc<[LibraryInfo]> = split_library(snapshot, library).into();
        self.infos.insert(generation, library, infos)
    }

    pub fn invalidate(&self, generation: u64) {
        self.infos.invalidate(generation);
    }
}

fn split_library(model: &ProjectModel, id: LibraryId) -> Vec<LibraryInfo> {
    let Some(library) = model.library(id) else {
        return Vec::new();
    };
    if library.disposed {
        return Vec::new();
    }

    let jars: Vec<LibraryRoot> = library
        .roots
        .iter()
        .filter(|root| matches!(root.kind, LibraryRootKind::Jar))
        .cloned()
        .collect();

    let mut out = Vec::new();
    if !jars.is_empty() {
        out.push(LibraryInfo {
            library: id,
            klib_root: None,
            name: library.name.clone(),
            platform: library.platform.clone().unwrap_or_else(TargetPlatform::jvm),
            roots: jars,
        });
    }

    for (idx, root) in library.roots.iter().enumerate() {
        if let LibraryRootKind::Klib(klib) = &root.kind {
            out.push(LibraryInfo {
                library: id,
                klib_root: Some(idx),
                name: library.name.clone(),
                platform: klib.platform.clone(),
                roots: vec![root.clone()],
            });
        }
    }

    out
}

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use orbit_config::{BuiltinsLoadingState, DependenciesConfig};
use orbit_deps::{DepsError, LibraryDependenciesCache, LibraryInfo};
use orbit_project::{
    Library, LibraryId, LibraryRoot, Module, ModuleId, OrderEntry, Project, ProjectDescriptor,
    ProjectModel, Sdk,
};
use orbit_scheduler::{CancellationToken, RequestContext};

fn testdata_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("testdata")
        .join(name)
}

fn load_fixture(name: &str) -> Arc<Project> {
    let descriptor = ProjectDescriptor::load(testdata_path(name)).expect("fixture should parse");
    Arc::new(Project::from_descriptor(&descriptor).expect("fixture should resolve"))
}

fn library(cache: &LibraryDependenciesCache, name: &str) -> LibraryInfo {
    let id = cache
        .project()
        .snapshot()
        .library_by_name(name)
        .unwrap_or_else(|| panic!("library `{name}` is missing"));
    cache.library_infos(id).unwrap()[0].clone()
}

fn module(cache: &LibraryDependenciesCache, name: &str) -> ModuleId {
    cache
        .project()
        .snapshot()
        .module_by_name(name)
        .unwrap_or_else(|| panic!("module `{name}` is missing"))
}

fn dependency_names(
    cache: &LibraryDependenciesCache,
    target: &str,
) -> Result<(Vec<String>, Vec<String>), DepsError> {
    let deps = cache.library_dependencies(&library(cache, target), &CancellationToken::new())?;
    Ok((
        deps.libraries.iter().map(|l| l.name().to_owned()).collect(),
        deps.sdks.iter().map(|s| s.name.clone()).collect(),
    ))
}

/// One JVM module using the standard library, an extension of it, and an unrelated library.
fn jvm_project() -> (Arc<Project>, ModuleId, LibraryId) {
    let mut model = ProjectModel::new();
    let jdk = model.add_sdk(Sdk::new("jdk-17"));
    let stdlib = model.add_library(
        Library::new("kotlin-stdlib").with_root(LibraryRoot::jar("libs/kotlin-stdlib-1.9.22.jar")),
    );
    let jdk8 = model.add_library(
        Library::new("kotlin-stdlib-jdk8")
            .with_root(LibraryRoot::jar("libs/kotlin-stdlib-jdk8-1.9.22.jar")),
    );
    let guava =
        model.add_library(Library::new("guava").with_root(LibraryRoot::jar("libs/guava-33.0.jar")));
    let app = model.add_module(
        Module::new("app")
            .with_dependency(OrderEntry::library(stdlib))
            .with_dependency(OrderEntry::library(jdk8))
            .with_dependency(OrderEntry::library(guava))
            .with_dependency(OrderEntry::sdk(jdk)),
    );
    (Arc::new(Project::new("jvm", model)), app, stdlib)
}

fn dependencies_builtins() -> DependenciesConfig {
    DependenciesConfig {
        builtins: BuiltinsLoadingState::Dependencies,
        ..DependenciesConfig::default()
    }
}

#[test]
fn unused_library_has_no_dependencies() {
    let (project, _app, _stdlib) = jvm_project();
    project.update(|model| {
        model.add_library(Library::new("orphan").with_root(LibraryRoot::jar("libs/orphan.jar")))
    });
    let cache = LibraryDependenciesCache::new(project, DependenciesConfig::default());

    let (libraries, sdks) = dependency_names(&cache, "orphan").unwrap();
    assert!(libraries.is_empty());
    assert!(sdks.is_empty());
}

#[test]
fn jvm_library_sees_everything_its_module_uses() {
    let (project, _app, _stdlib) = jvm_project();
    let cache = LibraryDependenciesCache::new(project, DependenciesConfig::default());

    let (libraries, sdks) = dependency_names(&cache, "guava").unwrap();
    assert_eq!(libraries, vec!["kotlin-stdlib", "kotlin-stdlib-jdk8", "guava"]);
    assert_eq!(sdks, vec!["jdk-17"]);
}

#[test]
fn stdlib_only_sees_core_libraries_when_builtins_come_from_dependencies() {
    let (project, _app, _stdlib) = jvm_project();
    let cache = LibraryDependenciesCache::new(project.clone(), dependencies_builtins());

    let (libraries, sdks) = dependency_names(&cache, "kotlin-stdlib").unwrap();
    assert_eq!(libraries, vec!["kotlin-stdlib", "kotlin-stdlib-jdk8"]);
    assert_eq!(sdks, vec!["jdk-17"]);

    // Non-core libraries are unaffected.
    let (libraries, _) = dependency_names(&cache, "guava").unwrap();
    assert_eq!(libraries.len(), 3);

    // Built-ins loaded from the class loader disable the restriction.
    let class_loader = LibraryDependenciesCache::new(project, DependenciesConfig::default());
    let (libraries, _) = dependency_names(&class_loader, "kotlin-stdlib").unwrap();
    assert_eq!(libraries, vec!["kotlin-stdlib", "kotlin-stdlib-jdk8", "guava"]);
}

#[test]
fn repeated_queries_are_memoized() {
    let (project, app, _stdlib) = jvm_project();
    let cache = LibraryDependenciesCache::new(project, DependenciesConfig::default());
    let token = CancellationToken::new();

    let first = cache.module_dependencies(app, &token).unwrap();
    let second = cache.module_dependencies(app, &token).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let info = library(&cache, "guava");
    let first = cache.library_dependencies(&info, &token).unwrap();
    let second = cache.library_dependencies(&info, &token).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn workspace_changes_invalidate_results() {
    let (project, app, _stdlib) = jvm_project();
    let cache = LibraryDependenciesCache::new(project.clone(), DependenciesConfig::default());
    let token = CancellationToken::new();
    let guava = library(&cache, "guava");

    let before = cache.library_dependencies(&guava, &token).unwrap();
    let before_module = cache.module_dependencies(app, &token).unwrap();

    project.update(|model| {
        let annotations = model.add_library(
            Library::new("annotations").with_root(LibraryRoot::jar("libs/annotations-24.1.0.jar")),
        );
        model
            .module_mut(app)
            .expect("app exists")
            .order_entries
            .push(OrderEntry::library(annotations));
    });

    let after = cache.library_dependencies(&guava, &token).unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(after.libraries.len(), before.libraries.len() + 1);
    assert_eq!(after.libraries.last().map(|l| l.name()), Some("annotations"));

    let after_module = cache.module_dependencies(app, &token).unwrap();
    assert_ne!(*before_module, *after_module);
}

#[test]
fn cancellation_stores_nothing_and_retry_succeeds() {
    let (project, _app, _stdlib) = jvm_project();
    let cache = LibraryDependenciesCache::new(project, DependenciesConfig::default());
    let info = library(&cache, "guava");

    let cancelled = CancellationToken::new();
    cancelled.cancel();
    assert_eq!(
        cache.library_dependencies(&info, &cancelled),
        Err(DepsError::Cancelled)
    );
    // A stored entry would be served without observing the token.
    assert_eq!(
        cache.library_dependencies(&info, &cancelled),
        Err(DepsError::Cancelled)
    );

    let deps = cache
        .library_dependencies(&info, &CancellationToken::new())
        .unwrap();
    assert_eq!(deps.libraries.len(), 3);
}

#[test]
fn expired_deadline_stops_the_computation() {
    let (project, _app, _stdlib) = jvm_project();
    let cache = LibraryDependenciesCache::new(project, DependenciesConfig::default());
    let info = library(&cache, "guava");

    let expired = RequestContext::new(CancellationToken::new()).with_deadline(Instant::now());
    assert_eq!(
        cache.library_dependencies_with_context(&info, &expired),
        Err(DepsError::Cancelled)
    );
    assert!(expired.token().is_cancelled());

    let pending = RequestContext::new(CancellationToken::new())
        .with_deadline(Instant::now() + Duration::from_secs(60));
    let deps = cache
        .library_dependencies_with_context(&info, &pending)
        .unwrap();
    assert_eq!(deps.libraries.len(), 3);

    // Cached results do not need the deadline.
    let cached = cache
        .library_dependencies_with_context(&info, &expired)
        .unwrap();
    assert!(Arc::ptr_eq(&deps, &cached));
}

#[test]
fn disposed_modules_are_reported() {
    let (project, app, _stdlib) = jvm_project();
    let cache = LibraryDependenciesCache::new(project.clone(), DependenciesConfig::default());
    let token = CancellationToken::new();
    cache.module_dependencies(app, &token).unwrap();

    project.update(|model| model.dispose_module(app));

    let expected = DepsError::ModuleDisposed {
        name: "app".to_owned(),
    };
    assert_eq!(cache.module_dependencies(app, &token), Err(expected.clone()));
    assert_eq!(cache.module_platform(app), Err(expected));

    // A disposed module no longer contributes usages.
    let (libraries, sdks) = dependency_names(&cache, "guava").unwrap();
    assert!(libraries.is_empty());
    assert!(sdks.is_empty());
}

#[test]
fn unknown_ids_are_errors() {
    let (project, _app, _stdlib) = jvm_project();
    let cache = LibraryDependenciesCache::new(project, DependenciesConfig::default());

    assert_eq!(
        cache.library_infos(LibraryId::from_raw(99)).unwrap_err(),
        DepsError::UnknownLibrary(LibraryId::from_raw(99))
    );
    assert_eq!(
        cache.module_platform(ModuleId::from_raw(99)),
        Err(DepsError::UnknownModule(ModuleId::from_raw(99)))
    );
}

#[test]
fn cyclic_module_graphs_terminate() {
    let mut model = ProjectModel::new();
    let lib = model.add_library(Library::new("lib").with_root(LibraryRoot::jar("libs/lib.jar")));
    let other = model.add_library(Library::new("other").with_root(LibraryRoot::jar("libs/other.jar")));
    let a = model.add_module(Module::new("a").with_dependency(OrderEntry::library(lib)));
    let b = model.add_module(
        Module::new("b")
            .with_dependency(OrderEntry::module(a))
            .with_dependency(OrderEntry::library(other)),
    );
    model
        .module_mut(a)
        .expect("a exists")
        .order_entries
        .push(OrderEntry::module(b));
    let cache = LibraryDependenciesCache::new(
        Arc::new(Project::new("cycle", model)),
        DependenciesConfig::default(),
    );

    let (libraries, _) = dependency_names(&cache, "lib").unwrap();
    assert_eq!(libraries, vec!["lib", "other"]);
}

#[test]
fn shared_native_library_sees_interop_klibs_of_its_targets() {
    let cache = LibraryDependenciesCache::new(
        load_fixture("kmp-hierarchy.json"),
        DependenciesConfig::default(),
    );

    let (libraries, sdks) = dependency_names(&cache, "shared-native-utils").unwrap();
    assert_eq!(
        libraries,
        vec![
            "stdlib-common",
            "coroutines-common",
            "shared-native-utils",
            "posix-linux",
            "posix-macos",
        ]
    );
    assert!(sdks.is_empty());
}

#[test]
fn single_target_library_only_uses_modules_that_can_see_it() {
    let cache = LibraryDependenciesCache::new(
        load_fixture("kmp-hierarchy.json"),
        DependenciesConfig::default(),
    );

    // `nativeMain` declares posix-linux too, but a shared native source set cannot see a
    // single-target klib, so only `linuxMain` contributes.
    let (libraries, _) = dependency_names(&cache, "posix-linux").unwrap();
    assert_eq!(
        libraries,
        vec![
            "stdlib-common",
            "coroutines-common",
            "shared-native-utils",
            "posix-linux",
            "ktor-linux",
        ]
    );
}

#[test]
fn native_modules_always_see_the_native_stdlib() {
    let cache = LibraryDependenciesCache::new(
        load_fixture("kmp-hierarchy.json"),
        DependenciesConfig::default(),
    );

    let modules = cache
        .project()
        .snapshot()
        .model()
        .modules()
        .map(|(id, _)| id)
        .collect::<Vec<_>>();
    assert_eq!(modules.len(), 4);

    let platform = cache.module_platform(module(&cache, "nativeMain")).unwrap();
    assert!(platform.is_shared_native());

    let stdlib = library(&cache, "native-stdlib");
    assert!(stdlib.is_native_stdlib());
    assert!(orbit_deps::can_depend_on(&platform, &stdlib, true));
    assert!(orbit_deps::can_depend_on(&platform, &stdlib, false));
}

#[test]
fn jvm_stdlib_in_multiplatform_project() {
    let cache = LibraryDependenciesCache::new(
        load_fixture("kmp-hierarchy.json"),
        dependencies_builtins(),
    );

    let (libraries, sdks) = dependency_names(&cache, "kotlin-stdlib").unwrap();
    assert_eq!(libraries, vec!["stdlib-common", "kotlin-stdlib"]);
    assert_eq!(sdks, vec!["jdk-17"]);
}

#[test]
fn concurrent_queries_agree() {
    let cache = LibraryDependenciesCache::new(
        load_fixture("kmp-hierarchy.json"),
        DependenciesConfig::default(),
    );
    let info = library(&cache, "posix-linux");

    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    cache
                        .library_dependencies(&info, &CancellationToken::new())
                        .unwrap()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("worker panicked"))
            .collect()
    });

    for result in &results[1..] {
        assert_eq!(**result, *results[0]);
    }
}

//! JSON project descriptors.
//!
//! A descriptor is the serialized form of a [`ProjectModel`]: modules, libraries and SDKs refer
//! to each other by name instead of by arena id.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    DependencyScope, KlibManifest, Library, LibraryRoot, Module, ModuleState, OrderEntry, Project,
    ProjectModel, Sdk, SourceSetKind, TargetPlatform,
};

#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("failed to read project descriptor {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse project descriptor: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate {kind} name `{name}`")]
    DuplicateName { kind: &'static str, name: String },
    #[error("module `{module}` depends on unknown {kind} `{name}`")]
    UnknownReference {
        module: String,
        kind: &'static str,
        name: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectDescriptor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub default_platform: Option<TargetPlatform>,
    #[serde(default)]
    pub sdks: Vec<SdkDescriptor>,
    #[serde(default)]
    pub libraries: Vec<LibraryDescriptor>,
    #[serde(default)]
    pub modules: Vec<ModuleDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SdkDescriptor {
    pub name: String,
    #[serde(default)]
    pub home: Option<PathBuf>,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LibraryDescriptor {
    pub name: String,
    #[serde(default)]
    pub roots: Vec<LibraryRootDescriptor>,
    #[serde(default)]
    pub platform: Option<TargetPlatform>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LibraryRootDescriptor {
    pub path: PathBuf,
    /// Present for Kotlin library (`.klib`) roots.
    #[serde(default)]
    pub klib: Option<KlibDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KlibDescriptor {
    pub unique_name: String,
    pub platform: TargetPlatform,
    #[serde(default)]
    pub interop: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleDescriptor {
    pub name: String,
    #[serde(default)]
    pub platform: Option<TargetPlatform>,
    #[serde(default)]
    pub hmpp: bool,
    #[serde(default)]
    pub unloaded: bool,
    #[serde(default = "default_source_sets")]
    pub source_sets: Vec<SourceSetKind>,
    #[serde(default)]
    pub dependencies: Vec<DependencyDescriptor>,
}

fn default_source_sets() -> Vec<SourceSetKind> {
    vec![SourceSetKind::Main]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencyDescriptor {
    Module {
        module: String,
        #[serde(default)]
        scope: DependencyScope,
        #[serde(default)]
        exported: bool,
    },
    Library {
        library: String,
        #[serde(default)]
        scope: DependencyScope,
        #[serde(default)]
        exported: bool,
    },
    Sdk {
        sdk: String,
    },
}

impl ProjectDescriptor {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ProjectError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ProjectError> {
        Ok(serde_json::from_str(text)?)
    }
}

impl Project {
    pub fn from_descriptor(descriptor: &ProjectDescriptor) -> Result<Self, ProjectError> {
        let model = ProjectModel::from_descriptor(descriptor)?;
        let name = descriptor.name.as_deref().unwrap_or("project");
        Ok(Project::new(name, model))
    }
}

fn check_unique<'a>(
    kind: &'static str,
    names: impl IntoIterator<Item = &'a str>,
) -> Result<(), ProjectError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ProjectError::DuplicateName {
                kind,
                name: name.to_owned(),
            });
        }
    }
    Ok(())
}

impl ProjectModel {
    /// Builds a model from a descriptor, resolving name references.
    ///
    /// Every module gets an implicit [`OrderEntry::ModuleSource`] before its declared
    /// dependencies, which keep their declaration order.
    pub fn from_descriptor(descriptor: &ProjectDescriptor) -> Result<Self, ProjectError> {
        check_unique("module", descriptor.modules.iter().map(|m| m.name.as_str()))?;
        check_unique("library", descriptor.libraries.iter().map(|l| l.name.as_str()))?;
        check_unique("sdk", descriptor.sdks.iter().map(|s| s.name.as_str()))?;

        let mut model = ProjectModel::new();
        model.default_platform = descriptor.default_platform.clone();

        for sdk in &descriptor.sdks {
            model.add_sdk(Sdk {
                name: sdk.name.clone(),
                home: sdk.home.clone(),
                version: sdk.version.clone(),
            });
        }

        for library in &descriptor.libraries {
            let mut out = Library::new(&library.name);
            out.platform = library.platform.clone();
            out.roots = library
                .roots
                .iter()
                .map(|root| match &root.klib {
                    Some(klib) => LibraryRoot::klib(
                        &root.path,
                        KlibManifest {
                            unique_name: klib.unique_name.clone(),
                            platform: klib.platform.clone(),
                            interop: klib.interop,
                        },
                    ),
                    None => LibraryRoot::jar(&root.path),
                })
                .collect();
            model.add_library(out);
        }

        // Register every module first so dependencies can point forward.
        let module_ids: Vec<_> = descriptor
            .modules
            .iter()
            .map(|module| {
                let mut out = Module::new(&module.name);
                out.platform = module.platform.clone();
                out.hmpp_enabled = module.hmpp;
                out.source_sets = module.source_sets.clone();
                if module.unloaded {
                    out.state = ModuleState::Unloaded;
                }
                model.add_module(out)
            })
            .collect();

        for (module, id) in descriptor.modules.iter().zip(module_ids) {
            let mut entries = vec![OrderEntry::ModuleSource];
            for dependency in &module.dependencies {
                entries.push(resolve_dependency(&model, &module.name, dependency)?);
            }
            if let Some(module) = model.module_mut(id) {
                module.order_entries = entries;
            }
        }

        Ok(model)
    }
}

fn resolve_dependency(
    model: &ProjectModel,
    owner: &str,
    dependency: &DependencyDescriptor,
) -> Result<OrderEntry, ProjectError> {
    let unknown = |kind: &'static str, name: &str| ProjectError::UnknownReference {
        module: owner.to_owned(),
        kind,
        name: name.to_owned(),
    };

    match dependency {
        DependencyDescriptor::Module {
            module,
            scope,
            exported,
        } => Ok(OrderEntry::Module {
            module: model
                .module_by_name(module)
                .ok_or_else(|| unknown("module", module))?,
            scope: *scope,
            exported: *exported,
        }),
        DependencyDescriptor::Library {
            library,
            scope,
            exported,
        } => Ok(OrderEntry::Library {
            library: model
                .library_by_name(library)
                .ok_or_else(|| unknown("library", library))?,
            scope: *scope,
            exported: *exported,
        }),
        DependencyDescriptor::Sdk { sdk } => Ok(OrderEntry::Sdk {
            sdk: model.sdk_by_name(sdk).ok_or_else(|| unknown("sdk", sdk))?,
        }),
    }
}

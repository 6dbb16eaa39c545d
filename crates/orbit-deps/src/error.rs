use orbit_project::{LibraryId, ModuleId};
use orbit_scheduler::Cancelled;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DepsError {
    #[error("module `{name}` is already disposed")]
    ModuleDisposed { name: String },
    #[error("unknown module {0:?}")]
    UnknownModule(ModuleId),
    #[error("unknown library {0:?}")]
    UnknownLibrary(LibraryId),
    #[error("dependency computation was cancelled")]
    Cancelled,
}

impl From<Cancelled> for DepsError {
    fn from(_: Cancelled) -> Self {
        DepsError::Cancelled
    }
}

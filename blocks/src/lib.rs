pub mod error;
pub mod host;
pub mod input;
pub mod layout;
pub mod policy;
pub mod procedure;
pub mod reconciler;
pub mod variant;
pub mod workspace;

pub use error::BlockError;
pub use host::{ContentId, ContentKind, Host};
pub use procedure::ProcedureBlock;
pub use variant::{BlockConfig, CALLER, INTERNAL_CALLER, MUTATOR_ROOT};
pub use workspace::Workspace;

pub mod clone;
pub mod orchestrator;
pub mod selector;
pub mod snapshot;
pub mod transaction;

pub use clone::{Cloner, ReflinkCloner};
pub use orchestrator::{MigrationSummary, Migrator};
pub use selector::{select, Selection};
pub use snapshot::MetadataSnapshot;
pub use transaction::{
    backup_path, CloneTransaction, MemberOutcome, OutcomeKind, OutcomeStatus, TransactionError,
};

pub mod record;
pub mod state;

pub use record::{Deferral, PendingRecord, PendingState, RecordSnapshot};
pub use state::{PendingDependenciesState, PendingSummary};

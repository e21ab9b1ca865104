mod engine;
mod reconciler;

pub use engine::{Registration, SyncEngine, start_sync_loop};
pub use reconciler::RoleReconciler;

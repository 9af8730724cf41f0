//! Tuning protocol the alter pass reads from and writes to.

pub mod cache;
pub mod context;
pub mod target;
pub mod workload;

pub use cache::{TuningCache, TuningError, TuningLog, TuningRecord};
pub use context::{
    GraphBestLookup, GraphBestRecords, ImplementationSelector, SelectError, Selection,
    StaticSelector, TuningContext, WorkloadSource,
};
pub use target::{Target, TargetError};
pub use workload::{TunedWorkload, TuningConfig, WorkloadKey};

//! Task-queue related types.
//!
//! The broader job-scheduling subsystem is external to this crate. The
//! acquisition engine only needs to submit named, categorized units of
//! work and to query the pending depth of a category for load shedding.

use crate::*;
#[cfg(any(test, feature = "mockall"))]
use mockall::automock;
use std::sync::Arc;

/// The category a unit of work is accounted under.
///
/// Categories let the owner apply different load policies to ledger
/// acquisition and transaction-set acquisition work.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum TaskCategory {
    /// Work driving acquisition of ledger data.
    LedgerData,

    /// Work driving acquisition of transaction-set data.
    TxData,
}

impl TaskCategory {
    /// All categories, for per-category accounting.
    pub const ALL: [TaskCategory; 2] =
        [TaskCategory::LedgerData, TaskCategory::TxData];

    /// The stable name of this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskCategory::LedgerData => "ledger_data",
            TaskCategory::TxData => "tx_data",
        }
    }
}

impl std::fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of work to be run by a [TaskQueue].
pub type Task = BoxFut<'static, ()>;

/// Represents the ability to run categorized units of work
/// asynchronously.
#[cfg_attr(any(test, feature = "mockall"), automock)]
pub trait TaskQueue: 'static + Send + Sync + std::fmt::Debug {
    /// Submit a named unit of work under a category.
    fn submit(
        &self,
        category: TaskCategory,
        name: &str,
        task: Task,
    ) -> PsResult<()>;

    /// Count of submitted work units in a category that have not yet
    /// finished running.
    fn pending_count(&self, category: TaskCategory) -> usize;
}

/// Trait-object [TaskQueue].
pub type DynTaskQueue = Arc<dyn TaskQueue>;

/// A factory for constructing [TaskQueue] instances.
pub trait TaskQueueFactory: 'static + Send + Sync + std::fmt::Debug {
    /// Help the builder construct a default config from the chosen
    /// module factories.
    fn default_config(&self, config: &mut config::Config) -> PsResult<()>;

    /// Validate configuration.
    fn validate_config(&self, config: &config::Config) -> PsResult<()>;

    /// Construct a task queue instance.
    fn create(
        &self,
        builder: Arc<builder::Builder>,
    ) -> BoxFut<'static, PsResult<DynTaskQueue>>;
}

/// Trait-object [TaskQueueFactory].
pub type DynTaskQueueFactory = Arc<dyn TaskQueueFactory>;

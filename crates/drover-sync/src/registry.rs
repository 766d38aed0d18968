use std::collections::HashMap;
use std::sync::Arc;

use tracing::{instrument, trace};

use drover_model::TaskType;

use crate::executor::PerpetualTaskExecutor;

/// Static dispatch table from task type to executor.
///
/// Populated once at agent startup; the worker resolves the type for each
/// task a single time at assignment and caches the executor with the
/// running handle.
#[derive(Default)]
pub struct ExecutorRegistry {
    executors: HashMap<TaskType, Arc<dyn PerpetualTaskExecutor>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self {
            executors: HashMap::new(),
        }
    }

    pub fn register(
        mut self,
        task_type: TaskType,
        executor: Arc<dyn PerpetualTaskExecutor>,
    ) -> Self {
        trace!(task_type = task_type.as_str(), "executor registered");
        self.executors.insert(task_type, executor);
        self
    }

    #[instrument(level = "trace", skip(self), fields(task_type = task_type.as_str()))]
    pub fn resolve(&self, task_type: TaskType) -> Option<Arc<dyn PerpetualTaskExecutor>> {
        self.executors.get(&task_type).cloned()
    }

    pub fn len(&self) -> usize {
        self.executors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }
}

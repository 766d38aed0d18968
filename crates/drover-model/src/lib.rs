mod task_id;
pub use task_id::TaskId;

mod task;
pub use task::{
    ClusterSyncParams, ConnectionConfig, Credentials, InstanceFilter, InstanceSyncParams,
    TaskContext, TaskParams, TaskSchedule, TaskType,
};

mod response;
pub use response::{ExecutionStatus, InstanceSyncResult, TaskResponse, TaskState};

mod snapshot;
pub use snapshot::{
    ContainerHost, ContainerTask, HostStatus, InstanceInfo, TaskDesiredStatus, VmInstance,
    VM_STATE_TERMINATED,
};

mod event;
pub use event::{ClusterEvent, ClusterSyncEvent, LifecycleEventKind};

mod cache;
pub use cache::ActiveInstanceCache;

pub mod timestamp;

mod error;
pub use error::DirectoryError;

mod directory;
pub use directory::{ClusterDirectory, InstanceDirectory};

mod executor;
pub use executor::PerpetualTaskExecutor;

mod registry;
pub use registry::ExecutorRegistry;

mod instance_sync;
pub use instance_sync::InstanceSyncExecutor;

mod cluster;
pub use cluster::{ClusterDiff, ClusterSyncExecutor, InstanceCacheStore, diff_cluster};

mod backoff;
pub use backoff::RpcBackoff;

mod lifecycle;
pub use lifecycle::TaskLifecycle;

mod worker;
pub use worker::PerpetualTaskWorker;

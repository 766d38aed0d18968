mod error;
pub use error::ClientError;

mod traits;
pub use traits::{ControlPlaneClient, EventPublisher};

mod http;
pub use http::HttpControlPlane;

mod identity;
pub use identity::worker_id;

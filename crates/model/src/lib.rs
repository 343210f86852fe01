pub mod env;
pub mod event;
pub mod response;
pub mod spec;

pub use event::{CustomResourceEvent, JobDefinitionProperties, RequestType};
pub use response::{CustomResourceResponse, LogLocation, ResponseStatus};
pub use spec::JobDefinitionSpec;

pub type Error = Box<dyn std::error::Error + Send + Sync>;

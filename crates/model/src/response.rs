use crate::CustomResourceEvent;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub use aws_lambda_events::cloudformation::CloudFormationCustomResourceResponseStatus as ResponseStatus;

/// Where the logs for an invocation end up, pointed at from failure reasons.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogLocation {
    pub log_group: String,
    pub log_stream: String,
}

impl LogLocation {
    pub fn new(log_group: impl Into<String>, log_stream: impl Into<String>) -> Self {
        LogLocation {
            log_group: log_group.into(),
            log_stream: log_stream.into(),
        }
    }

    pub fn failure_reason(&self) -> String {
        format!(
            "see log group {} / log stream {}",
            self.log_group, self.log_stream
        )
    }
}

/// Body of the PUT made to the `ResponseURL` of a custom resource request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceResponse {
    pub physical_resource_id: Option<String>,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    pub status: ResponseStatus,
    pub reason: String,
    pub no_echo: bool,
    pub data: BTreeMap<String, Value>,
}

impl CustomResourceResponse {
    /// A response for `event` which reports failure until told otherwise.
    pub fn failed(event: &CustomResourceEvent, no_echo: bool) -> Self {
        CustomResourceResponse {
            physical_resource_id: event.physical_resource_id.clone(),
            stack_id: event.stack_id.clone(),
            request_id: event.request_id.clone(),
            logical_resource_id: event.logical_resource_id.clone(),
            status: ResponseStatus::Failed,
            reason: String::new(),
            no_echo,
            data: BTreeMap::new(),
        }
    }

    /// Add an output readable through `Fn::GetAtt` on the custom resource.
    pub fn return_value(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(key.into(), value.into());
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}

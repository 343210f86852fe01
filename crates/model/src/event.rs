use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

/// A CloudFormation custom resource request as delivered to the Lambda.
///
/// `ResourceProperties` stays untyped here. Parsing it happens inside the
/// responder so a bad property set still produces a FAILED callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceEvent {
    pub request_type: RequestType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    #[serde(rename = "ResponseURL")]
    pub response_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_token: Option<String>,
    #[serde(default)]
    pub resource_properties: Value,
    // Update only. A new revision is always registered so these are not read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_resource_properties: Option<Value>,
}

/// The `ResourceProperties` of a job definition custom resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDefinitionProperties {
    pub workflow_name: String,
    pub step_name: String,
    pub image: Value,
    /// JSON serialised `JobDefinitionSpec`
    pub spec: String,
}

impl JobDefinitionProperties {
    pub fn from_value(properties: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(properties)
    }
}

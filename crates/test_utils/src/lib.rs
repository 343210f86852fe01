use async_trait::async_trait;
use aws_sdk_batch::operation::register_job_definition::RegisterJobDefinitionOutput;
use model::env::AccountConfig;
use model::spec::ContainerProperties;
use model::{CustomResourceEvent, CustomResourceResponse, JobDefinitionSpec, RequestType};
use responder::{DeliveryError, ResponseSender};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Test values
pub const TEST_ARN: &str = "arn:aws:batch:us-east-1:123456789012:job-definition/wf1_step1:3";
pub const TEST_REGION: &str = "us-east-1";
pub const TEST_ACCOUNT: &str = "123456789012";
pub const TEST_RESPONSE_URL: &str =
    "https://cloudformation-custom-resource-response-useast1.s3.amazonaws.com/stack/request?X-Amz-Signature=abc";

pub fn test_account() -> AccountConfig {
    AccountConfig {
        region: TEST_REGION.to_string(),
        account_id: TEST_ACCOUNT.to_string(),
    }
}

/// The smallest spec `edit_spec` accepts.
pub fn minimal_spec() -> JobDefinitionSpec {
    JobDefinitionSpec {
        job_definition_name: None,
        job_type: "container".to_string(),
        parameters: BTreeMap::new(),
        container_properties: ContainerProperties {
            image: Some("public.ecr.aws/docker/library/busybox:latest".to_string()),
            command: vec!["true".to_string()],
            job_role_arn: None,
            execution_role_arn: None,
            volumes: vec![],
            environment: vec![],
            mount_points: vec![],
            resource_requirements: vec![],
        },
        consumable_resource_properties: None,
        scheduling_priority: None,
        timeout: None,
        retry_strategy: None,
        propagate_tags: None,
        tags: BTreeMap::new(),
    }
}

/// Resource properties as CloudFormation would send them for `minimal_spec`.
pub fn job_definition_properties(workflow_name: &str, step_name: &str) -> Value {
    let spec: String = serde_json::to_string(&minimal_spec()).expect("Spec should serialise");

    json!({
        "ServiceToken": "arn:aws:lambda:us-east-1:123456789012:function:register-job-def",
        "workflowName": workflow_name,
        "stepName": step_name,
        "image": {"tag": "v2", "repo": "x"},
        "spec": spec,
    })
}

pub fn custom_resource_event(
    request_type: RequestType,
    physical_resource_id: Option<&str>,
    resource_properties: Value,
) -> CustomResourceEvent {
    CustomResourceEvent {
        request_type,
        physical_resource_id: physical_resource_id.map(str::to_string),
        stack_id: "arn:aws:cloudformation:us-east-1:123456789012:stack/test/1".to_string(),
        request_id: "request-1".to_string(),
        logical_resource_id: "StepJobDefinition".to_string(),
        response_url: TEST_RESPONSE_URL.to_string(),
        resource_type: Some("Custom::BatchJobDefinition".to_string()),
        service_token: None,
        resource_properties,
        old_resource_properties: None,
    }
}

pub fn register_output(arn: &str) -> RegisterJobDefinitionOutput {
    RegisterJobDefinitionOutput::builder()
        .job_definition_name("wf1_step1")
        .job_definition_arn(arn)
        .revision(3)
        .build()
}

/// A sender which records responses instead of making HTTP requests.
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<CustomResourceResponse>>,
    fail: bool,
}

impl RecordingSender {
    /// A sender whose every delivery fails after being recorded.
    pub fn failing() -> Self {
        RecordingSender {
            sent: Mutex::new(vec![]),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<CustomResourceResponse> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResponseSender for RecordingSender {
    async fn send(
        &self,
        _response_url: &str,
        response: &CustomResourceResponse,
    ) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push(response.clone());

        if self.fail {
            return Err(DeliveryError::Rejected {
                status: 403,
                body: "AccessDenied".to_string(),
            });
        }

        Ok(())
    }
}

use async_trait::async_trait;
use aws_sdk_batch::error::DisplayErrorContext;
use aws_sdk_batch::operation::register_job_definition::RegisterJobDefinitionOutput;
use aws_sdk_batch::types::JobDefinitionType;
use lambda_runtime::tracing;
use model::JobDefinitionSpec;
use std::collections::HashMap;
use thiserror::Error;

mod convert;

/// Registers and retires revisions of job definitions.
#[async_trait]
pub trait JobDefinitionRegistry: Send + Sync {
    /// Register `spec` as a new revision, returning its ARN.
    /// Earlier revisions remain active.
    async fn register(&self, spec: &JobDefinitionSpec) -> Result<String, RegistryError>;

    async fn deregister(&self, job_definition: &str) -> Result<(), RegistryError>;
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("job definition name is not set")]
    MissingName,
    #[error("failed to register job definition {name}: {message}")]
    Register { name: String, message: String },
    #[error("registration of job definition {name} returned no ARN")]
    MissingArn { name: String },
    #[error("failed to deregister job definition {job_definition}: {message}")]
    Deregister {
        job_definition: String,
        message: String,
    },
}

pub struct BatchRegistry {
    batch_client: aws_sdk_batch::Client,
}

impl BatchRegistry {
    pub fn new(batch_client: aws_sdk_batch::Client) -> Self {
        BatchRegistry { batch_client }
    }
}

#[async_trait]
impl JobDefinitionRegistry for BatchRegistry {
    async fn register(&self, spec: &JobDefinitionSpec) -> Result<String, RegistryError> {
        let name: &str = spec
            .job_definition_name
            .as_deref()
            .ok_or(RegistryError::MissingName)?;

        let tags: Option<HashMap<String, String>> = (!spec.tags.is_empty()).then(|| {
            spec.tags
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        });
        let parameters: Option<HashMap<String, String>> = (!spec.parameters.is_empty()).then(|| {
            spec.parameters
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        });

        let output: RegisterJobDefinitionOutput = self
            .batch_client
            .register_job_definition()
            .job_definition_name(name)
            .r#type(JobDefinitionType::from(spec.job_type.as_str()))
            .set_parameters(parameters)
            .container_properties(convert::container_properties(&spec.container_properties))
            .set_consumable_resource_properties(
                spec.consumable_resource_properties
                    .as_ref()
                    .map(convert::consumable_resource_properties),
            )
            .set_scheduling_priority(spec.scheduling_priority)
            .set_timeout(spec.timeout.as_ref().map(convert::timeout))
            .set_retry_strategy(spec.retry_strategy.as_ref().map(convert::retry_strategy))
            .set_propagate_tags(spec.propagate_tags)
            .set_tags(tags)
            .send()
            .await
            .map_err(|err| RegistryError::Register {
                name: name.to_string(),
                message: DisplayErrorContext(err).to_string(),
            })?;

        let arn: &str = output
            .job_definition_arn()
            .ok_or_else(|| RegistryError::MissingArn {
                name: name.to_string(),
            })?;

        tracing::info!(
            arn,
            revision = ?output.revision(),
            "Registered job definition {name}"
        );

        Ok(arn.to_string())
    }

    async fn deregister(&self, job_definition: &str) -> Result<(), RegistryError> {
        self.batch_client
            .deregister_job_definition()
            .job_definition(job_definition)
            .send()
            .await
            .map_err(|err| RegistryError::Deregister {
                job_definition: job_definition.to_string(),
                message: DisplayErrorContext(err).to_string(),
            })?;

        tracing::info!("Deregistered job definition {job_definition}");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_batch::operation::deregister_job_definition::{
        DeregisterJobDefinitionError, DeregisterJobDefinitionOutput,
    };
    use aws_sdk_batch::operation::register_job_definition::RegisterJobDefinitionError;
    use aws_sdk_batch::types::error::ClientException;
    use aws_sdk_batch::types::{EfsAuthorizationConfigIam, RetryAction};
    use aws_smithy_mocks::{mock, mock_client};
    use test_utils::{TEST_ARN, minimal_spec, register_output};

    fn named_spec() -> JobDefinitionSpec {
        let mut spec: JobDefinitionSpec = minimal_spec();
        spec.job_definition_name = Some("wf1_step1".to_string());
        spec.tags.insert("bclaw:workflow".to_string(), "wf1".to_string());
        spec.parameters.insert("image".to_string(), "{}".to_string());
        spec.container_properties
            .environment
            .push(model::spec::KeyValuePair::new("BC_STEP_NAME", "step1"));
        spec
    }

    #[tokio::test]
    async fn register_returns_arn() {
        let rule = mock!(aws_sdk_batch::Client::register_job_definition)
            .match_requests(|req| {
                req.job_definition_name() == Some("wf1_step1")
                    && req.r#type() == Some(&JobDefinitionType::Container)
                    && req.tags().and_then(|tags| tags.get("bclaw:workflow"))
                        == Some(&"wf1".to_string())
                    && req
                        .container_properties()
                        .map(|props| props.environment().len())
                        == Some(1)
            })
            .then_output(|| register_output(TEST_ARN));
        let registry = BatchRegistry::new(mock_client!(aws_sdk_batch, [&rule]));

        let arn: String = registry
            .register(&named_spec())
            .await
            .expect("Registration should succeed");

        assert_eq!(TEST_ARN, arn);
        assert_eq!(1, rule.num_calls());
    }

    const FULL_SPEC: &str = r#"{
        "jobDefinitionName": "wf1_step1",
        "type": "container",
        "parameters": {"image": "{\"repo\":\"x\"}"},
        "containerProperties": {
            "image": "repo:v2",
            "environment": [{"name": "BC_STEP_NAME", "value": "step1"}],
            "volumes": [
                {"name": "scratch", "host": {"sourcePath": "/scratch"}},
                {
                    "name": "shared",
                    "efsVolumeConfiguration": {
                        "fileSystemId": "fs-123",
                        "transitEncryption": "ENABLED",
                        "transitEncryptionPort": 2049,
                        "authorizationConfig": {"accessPointId": "fsap-1", "iam": "ENABLED"}
                    }
                }
            ]
        },
        "consumableResourceProperties": {
            "consumableResourceList": [{"consumableResource": "licenses", "quantity": 2}]
        },
        "schedulingPriority": 10,
        "timeout": {"attemptDurationSeconds": 3600},
        "retryStrategy": {
            "attempts": 3,
            "evaluateOnExit": [{"onExitCode": "137", "action": "RETRY"}]
        },
        "propagateTags": true,
        "tags": {"bclaw:workflow": "wf1"}
    }"#;

    #[tokio::test]
    async fn register_sends_every_spec_field() {
        let spec: JobDefinitionSpec =
            serde_json::from_str(FULL_SPEC).expect("Spec should parse");
        let rule = mock!(aws_sdk_batch::Client::register_job_definition)
            .match_requests(|req| {
                let consumable = req
                    .consumable_resource_properties()
                    .map(|props| props.consumable_resource_list())
                    .unwrap_or_default();
                let retry = req.retry_strategy();
                let volumes = req
                    .container_properties()
                    .map(|props| props.volumes())
                    .unwrap_or_default();
                let efs_auth = volumes
                    .get(1)
                    .and_then(|volume| volume.efs_volume_configuration())
                    .and_then(|efs| efs.authorization_config());

                consumable.len() == 1
                    && consumable[0].consumable_resource() == Some("licenses")
                    && consumable[0].quantity() == Some(2)
                    && req.scheduling_priority() == Some(10)
                    && req.timeout().and_then(|t| t.attempt_duration_seconds()) == Some(3600)
                    && retry.and_then(|r| r.attempts()) == Some(3)
                    && retry
                        .map(|r| r.evaluate_on_exit())
                        .and_then(|conditions| conditions.first())
                        .is_some_and(|condition| {
                            condition.on_exit_code() == Some("137")
                                && condition.action() == Some(&RetryAction::Retry)
                        })
                    && req.propagate_tags() == Some(true)
                    && req.parameters().and_then(|params| params.get("image"))
                        == Some(&r#"{"repo":"x"}"#.to_string())
                    && volumes.len() == 2
                    && volumes[0].host().and_then(|host| host.source_path()) == Some("/scratch")
                    && efs_auth.and_then(|auth| auth.access_point_id()) == Some("fsap-1")
                    && efs_auth.and_then(|auth| auth.iam())
                        == Some(&EfsAuthorizationConfigIam::Enabled)
            })
            .then_output(|| register_output(TEST_ARN));
        let registry = BatchRegistry::new(mock_client!(aws_sdk_batch, [&rule]));

        let arn: String = registry
            .register(&spec)
            .await
            .expect("Registration should succeed");

        assert_eq!(TEST_ARN, arn);
        assert_eq!(1, rule.num_calls());
    }

    #[tokio::test]
    async fn register_without_arn_is_an_error() {
        let rule = mock!(aws_sdk_batch::Client::register_job_definition).then_output(|| {
            RegisterJobDefinitionOutput::builder()
                .job_definition_name("wf1_step1")
                .revision(3)
                .build()
        });
        let registry = BatchRegistry::new(mock_client!(aws_sdk_batch, [&rule]));

        let result = registry.register(&named_spec()).await;

        match result {
            Err(RegistryError::MissingArn { name }) => assert_eq!("wf1_step1", name),
            other => panic!("Expected a missing ARN error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn register_requires_a_name() {
        let rule = mock!(aws_sdk_batch::Client::register_job_definition)
            .then_output(|| register_output(TEST_ARN));
        let registry = BatchRegistry::new(mock_client!(aws_sdk_batch, [&rule]));

        let result = registry.register(&minimal_spec()).await;

        assert!(matches!(result, Err(RegistryError::MissingName)));
        assert_eq!(0, rule.num_calls());
    }

    #[tokio::test]
    async fn register_reports_rejection() {
        let rule = mock!(aws_sdk_batch::Client::register_job_definition).then_error(|| {
            RegisterJobDefinitionError::ClientException(
                ClientException::builder()
                    .message("invalid resource requirement")
                    .build(),
            )
        });
        let registry = BatchRegistry::new(mock_client!(aws_sdk_batch, [&rule]));

        let result = registry.register(&named_spec()).await;

        match result {
            Err(RegistryError::Register { name, .. }) => assert_eq!("wf1_step1", name),
            other => panic!("Expected a registration error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn deregister_sends_identifier() {
        let rule = mock!(aws_sdk_batch::Client::deregister_job_definition)
            .match_requests(|req| req.job_definition() == Some(TEST_ARN))
            .then_output(|| DeregisterJobDefinitionOutput::builder().build());
        let registry = BatchRegistry::new(mock_client!(aws_sdk_batch, [&rule]));

        registry
            .deregister(TEST_ARN)
            .await
            .expect("Deregistration should succeed");

        assert_eq!(1, rule.num_calls());
    }

    #[tokio::test]
    async fn deregister_reports_failure() {
        let rule = mock!(aws_sdk_batch::Client::deregister_job_definition).then_error(|| {
            DeregisterJobDefinitionError::ClientException(
                ClientException::builder().message("not found").build(),
            )
        });
        let registry = BatchRegistry::new(mock_client!(aws_sdk_batch, [&rule]));

        let result = registry.deregister(TEST_ARN).await;

        assert!(matches!(result, Err(RegistryError::Deregister { .. })));
    }
}

use job_def::edit_spec;
use lambda_runtime::LambdaEvent;
use lambda_runtime::tracing::{self, Instrument, Span};
use model::env::{AccountConfig, ConfigError};
use model::{
    CustomResourceEvent, CustomResourceResponse, Error, JobDefinitionProperties,
    JobDefinitionSpec, LogLocation, RequestType,
};
use registry::JobDefinitionRegistry;
use responder::{DeliveryError, Responder, ResponseSender};
use std::sync::Arc;

/// Output attribute holding the ARN of the registered revision.
pub const ARN_OUTPUT: &str = "Arn";

/// Handles custom resource requests for job definitions.
///
/// Create and Update register a new revision without deactivating older ones.
/// Delete deregisters the revision named by the physical resource id.
pub struct CustomResourceHandler {
    registry: Arc<dyn JobDefinitionRegistry>,
    sender: Arc<dyn ResponseSender>,
    account: Result<AccountConfig, ConfigError>,
    no_echo: bool,
}

impl CustomResourceHandler {
    pub fn new(
        registry: Arc<dyn JobDefinitionRegistry>,
        sender: Arc<dyn ResponseSender>,
        account: Result<AccountConfig, ConfigError>,
        no_echo: bool,
    ) -> Self {
        CustomResourceHandler {
            registry,
            sender,
            account,
            no_echo,
        }
    }

    /// Entry point for `lambda_runtime::run`.
    /// Only a failure to deliver the response to CloudFormation is returned.
    pub async fn handle(&self, event: LambdaEvent<CustomResourceEvent>) -> Result<(), Error> {
        let (event, context) = event.into_parts();
        let log_location = LogLocation::new(
            context.env_config.log_group.as_str(),
            context.env_config.log_stream.as_str(),
        );

        let span: Span = tracing::info_span!(
            "Custom resource",
            request_id = event.request_id.as_str(),
            logical_resource_id = event.logical_resource_id.as_str(),
        );

        self.respond(&event, log_location).instrument(span).await?;

        Ok(())
    }

    pub async fn respond(
        &self,
        event: &CustomResourceEvent,
        log_location: LogLocation,
    ) -> Result<CustomResourceResponse, DeliveryError> {
        tracing::info!(?event, "Handling {:?} request", event.request_type);

        Responder::new(event, log_location, self.no_echo)
            .respond_with(
                self.sender.as_ref(),
                async |response: &mut CustomResourceResponse| self.dispatch(event, response).await,
            )
            .await
    }

    async fn dispatch(
        &self,
        event: &CustomResourceEvent,
        response: &mut CustomResourceResponse,
    ) -> Result<(), Error> {
        match event.request_type {
            RequestType::Create | RequestType::Update => self.register(event, response).await,
            RequestType::Delete => {
                self.deregister(event).await;

                Ok(())
            }
        }
    }

    async fn register(
        &self,
        event: &CustomResourceEvent,
        response: &mut CustomResourceResponse,
    ) -> Result<(), Error> {
        let properties: JobDefinitionProperties =
            JobDefinitionProperties::from_value(&event.resource_properties)?;
        let template: JobDefinitionSpec = serde_json::from_str(&properties.spec)?;
        let account: AccountConfig = self.account.clone()?;

        let spec: JobDefinitionSpec = edit_spec(
            &template,
            &properties.workflow_name,
            &properties.step_name,
            &properties.image,
            &account,
        );
        tracing::info!(?spec, "Edited job definition");

        let arn: String = self.registry.register(&spec).await?;

        response.physical_resource_id = Some(arn.clone());
        response.return_value(ARN_OUTPUT, arn);

        Ok(())
    }

    // Never fails: a revision that can't be deregistered must not block stack deletion
    async fn deregister(&self, event: &CustomResourceEvent) {
        match event.physical_resource_id.as_deref() {
            Some(job_definition) => {
                if let Err(err) = self.registry.deregister(job_definition).await {
                    tracing::warn!(error = %err, "deregistration failed");
                }
            }
            None => tracing::warn!("no physical resource id found"),
        }
    }
}

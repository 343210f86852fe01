use crate::handler::CustomResourceHandler;
use aws_config::BehaviorVersion;
use lambda_runtime::{LambdaEvent, service_fn, tracing};
use model::env::{self, AccountConfig};
use model::{CustomResourceEvent, Error};
use registry::BatchRegistry;
use responder::HttpResponseSender;
use std::sync::Arc;

mod handler;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::init_default_subscriber();

    let no_echo: bool = env::no_echo_from_env().unwrap_or_else(|err| {
        tracing::warn!("{err}, responses will be echoed");
        false
    });

    let batch_client: aws_sdk_batch::Client =
        aws_sdk_batch::Client::new(&aws_config::load_defaults(BehaviorVersion::latest()).await);

    let handler: CustomResourceHandler = CustomResourceHandler::new(
        Arc::new(BatchRegistry::new(batch_client)),
        Arc::new(HttpResponseSender::default()),
        // A missing variable is reported per request, through the response
        AccountConfig::from_env(),
        no_echo,
    );
    let handler_ref: &CustomResourceHandler = &handler;

    lambda_runtime::run(service_fn(
        move |event: LambdaEvent<CustomResourceEvent>| async move {
            handler_ref.handle(event).await
        },
    ))
    .await
}

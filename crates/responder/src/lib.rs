use futures::FutureExt;
use lambda_runtime::tracing;
use model::{CustomResourceEvent, CustomResourceResponse, Error, LogLocation, ResponseStatus};
use std::any::Any;
use std::panic::AssertUnwindSafe;

pub mod sender;

pub use sender::{DeliveryError, HttpResponseSender, ResponseSender};

/// Reports the outcome of a custom resource request back to CloudFormation.
///
/// The response starts out `FAILED`. It is only marked `SUCCESS` once the
/// handling body has returned `Ok`, and it is delivered exactly once whatever
/// the body does.
pub struct Responder {
    response_url: String,
    log_location: LogLocation,
    response: CustomResourceResponse,
}

impl Responder {
    pub fn new(event: &CustomResourceEvent, log_location: LogLocation, no_echo: bool) -> Self {
        Responder {
            response_url: event.response_url.clone(),
            log_location,
            response: CustomResourceResponse::failed(event, no_echo),
        }
    }

    /// Run `body` with write access to the response, then deliver it.
    ///
    /// Errors and panics from `body` are logged and reported as `FAILED`.
    /// Only a failure to deliver the response is returned.
    pub async fn respond_with<Body>(
        mut self,
        sender: &dyn ResponseSender,
        body: Body,
    ) -> Result<CustomResourceResponse, DeliveryError>
    where
        Body: AsyncFnOnce(&mut CustomResourceResponse) -> Result<(), Error>,
    {
        let outcome: Result<(), Error> = AssertUnwindSafe(body(&mut self.response))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(panic_message(panic).into()));

        self.finish(sender, outcome).await
    }

    /// Settle the response from the outcome of the handling body and deliver it.
    pub async fn finish(
        mut self,
        sender: &dyn ResponseSender,
        outcome: Result<(), Error>,
    ) -> Result<CustomResourceResponse, DeliveryError> {
        match outcome {
            Ok(()) => {
                tracing::info!("succeeded");
                self.response.status = ResponseStatus::Success;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed");
                self.response.reason = self.log_location.failure_reason();
            }
        }

        tracing::info!(response = ?self.response, "Sending custom resource response");

        sender.send(&self.response_url, &self.response).await?;

        Ok(self.response)
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    let detail: &str = panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic");

    format!("panicked: {detail}")
}

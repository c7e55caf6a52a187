//! Chat-model client construction.
//!
//! Builds a genai [`Client`] pinned to an OpenAI-compatible endpoint. No
//! validation and no connectivity check happen here: an empty base URL or
//! API key surfaces as an auth/transport error on the first chat request,
//! not at construction time.

use genai::adapter::AdapterKind;
use genai::resolver::{AuthData, Endpoint, ServiceTargetResolver};
use genai::{Client, ModelIden, ServiceTarget};

/// Build a chat client bound to `base_url` with bearer `api_key`.
///
/// The resolver rewrites every service target to the configured endpoint
/// with the OpenAI adapter, keeping whatever model name the request carries.
pub fn build_chat_client(base_url: &str, api_key: &str) -> Client {
    let base_url = base_url.to_string();
    let api_key = api_key.to_string();

    let target_resolver = ServiceTargetResolver::from_resolver_fn(
        move |service_target: ServiceTarget| -> Result<ServiceTarget, genai::resolver::Error> {
            let ServiceTarget { model, .. } = service_target;
            Ok(ServiceTarget {
                endpoint: Endpoint::from_owned(base_url.clone()),
                auth: AuthData::from_single(api_key.clone()),
                model: ModelIden::new(AdapterKind::OpenAI, model.model_name),
            })
        },
    );

    Client::builder()
        .with_service_target_resolver(target_resolver)
        .build()
}

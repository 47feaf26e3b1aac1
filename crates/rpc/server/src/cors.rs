use http::{HeaderValue, Method};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Error thrown when parsing cors domains went wrong
#[derive(Debug, thiserror::Error)]
pub enum CorsDomainError {
    #[error("{domain} is an invalid header value")]
    InvalidHeader { domain: String },
    #[error("Wildcard origin (`*`) cannot be passed as part of a list: {input}")]
    WildCardNotAllowed { input: String },
}

/// Creates a [`CorsLayer`] from the allowed origins. A single `*` allows any origin.
pub fn create_cors_layer(domains: &[String]) -> Result<CorsLayer, CorsDomainError> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    if let [only] = domains {
        if only.trim() == "*" {
            return Ok(layer.allow_origin(Any));
        }
    }

    if domains.iter().any(|domain| domain.trim() == "*") {
        return Err(CorsDomainError::WildCardNotAllowed {
            input: domains.join(","),
        });
    }

    let origins = domains
        .iter()
        .map(|domain| {
            domain
                .trim()
                .parse::<HeaderValue>()
                .map_err(|_| CorsDomainError::InvalidHeader {
                    domain: domain.clone(),
                })
        })
        .collect::<Result<Vec<HeaderValue>, _>>()?;

    Ok(layer.allow_origin(AllowOrigin::list(origins)))
}

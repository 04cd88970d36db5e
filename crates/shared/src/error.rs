use thiserror::Error;

/// Failure talking to the headline provider or the language model.
///
/// Never escapes the source or judge boundary: callers turn it into an empty
/// result or the judge's conservative answer.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {service} failed: {source}")]
    Request {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to decode {service} response: {source}")]
    Decode {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned an empty completion")]
    EmptyCompletion { service: &'static str },
}

impl TransportError {
    pub(crate) async fn from_response(service: &'static str, response: reqwest::Response) -> Self {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("unknown error"));
        TransportError::Status {
            service,
            status,
            body,
        }
    }
}

use thiserror::Error;

/// Failures reported by an image generation service, as opposed to transport errors.
#[derive(Debug, Error)]
pub enum ImageApiError {
    #[error("Request failed ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("Request moderated: {message}")]
    Moderated { message: String },

    #[error("Generation {id} faulted")]
    Faulted { id: String },

    #[error("Generation {id} can not be completed with the current workers")]
    Impossible { id: String },

    #[error("Response contained no images")]
    NoImages,
}

impl ImageApiError {
    /// Sorts a non-success response into a variant, using the `message` field of json bodies.
    pub fn from_response(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v["message"].as_str().map(str::to_string));

        match (status, message) {
            (403, Some(message)) if message.to_lowercase().contains("moderat") => {
                Self::Moderated { message }
            }
            (_, Some(message)) => Self::Status {
                status,
                body: message,
            },
            (_, None) => Self::Status { status, body },
        }
    }
}

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum CoreError {
    #[error("No cognitive profile selected")]
    #[diagnostic(
        code(cogniadapt_core::profile_not_selected),
        help("Select a profile first: ADHD, Dyslexia, Visual, Auditory, Kinesthetic, or Autism")
    )]
    ProfileNotSelected,

    #[error("Unknown cognitive profile")]
    #[diagnostic(
        code(cogniadapt_core::unknown_profile),
        help("Valid profiles: {}", valid.join(", "))
    )]
    UnknownProfile { tag: String, valid: Vec<String> },

    #[error("Empty input")]
    #[diagnostic(
        code(cogniadapt_core::empty_input),
        help("The '{field}' input must not be empty")
    )]
    EmptyInput { field: String },

    #[error("Another operation is already in flight")]
    #[diagnostic(
        code(cogniadapt_core::operation_in_flight),
        help("Wait for the current '{operation}' operation to finish before starting another")
    )]
    OperationInFlight { operation: String },

    #[error("Generative backend request failed")]
    #[diagnostic(
        code(cogniadapt_core::backend_request_failed),
        help("Check API credentials and connectivity for model '{model}'")
    )]
    BackendRequestFailed {
        model: String,
        #[source]
        cause: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Generative backend returned {status}")]
    #[diagnostic(
        code(cogniadapt_core::backend_status),
        help("Response body: {body}")
    )]
    BackendStatus {
        model: String,
        status: u16,
        body: String,
    },

    #[error("Malformed backend response")]
    #[diagnostic(
        code(cogniadapt_core::malformed_response),
        help("Model '{model}' returned a payload that could not be parsed: {detail}")
    )]
    MalformedResponse { model: String, detail: String },

    #[error("Transformed content failed validation")]
    #[diagnostic(
        code(cogniadapt_core::content_invalid),
        help("{detail}")
    )]
    ContentInvalid { detail: String },

    #[error("Media file could not be read")]
    #[diagnostic(
        code(cogniadapt_core::media_read_failed),
        help("Check that '{path}' exists and is readable")
    )]
    MediaReadFailed {
        path: String,
        #[source]
        cause: std::io::Error,
    },

    #[error("Unsupported media type")]
    #[diagnostic(
        code(cogniadapt_core::unsupported_media),
        help("Could not determine a media type for '{path}'")
    )]
    UnsupportedMedia { path: String },

    #[error("Video generation failed")]
    #[diagnostic(code(cogniadapt_core::animation_failed), help("{detail}"))]
    AnimationFailed { detail: String },

    #[error("Prompt template error")]
    #[diagnostic(
        code(cogniadapt_core::template_error),
        help("Template '{template}' failed to render")
    )]
    TemplateError {
        template: String,
        #[source]
        cause: minijinja::Error,
    },

    #[error("Profile storage error")]
    #[diagnostic(
        code(cogniadapt_core::storage_error),
        help("Check that '{path}' is readable and writable")
    )]
    StorageError {
        path: String,
        #[source]
        cause: std::io::Error,
    },

    #[error("Configuration error")]
    #[diagnostic(
        code(cogniadapt_core::configuration_error),
        help("Check configuration file at {config_path}")
    )]
    ConfigurationError {
        config_path: String,
        field: String,
        expected: String,
        #[source]
        cause: Box<dyn std::error::Error + Send + Sync>,
    },
}

pub type Result<T> = std::result::Result<T, CoreError>;

// Helper constructors for errors that get built in several places
impl CoreError {
    pub fn unknown_profile(tag: impl Into<String>) -> Self {
        Self::UnknownProfile {
            tag: tag.into(),
            valid: crate::profile::CognitiveProfile::ALL
                .iter()
                .map(|p| p.as_str().to_string())
                .collect(),
        }
    }

    pub fn empty_input(field: impl Into<String>) -> Self {
        Self::EmptyInput {
            field: field.into(),
        }
    }

    pub fn in_flight(operation: impl Into<String>) -> Self {
        Self::OperationInFlight {
            operation: operation.into(),
        }
    }

    pub fn backend_error(
        model: impl Into<String>,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::BackendRequestFailed {
            model: model.into(),
            cause: Box::new(cause),
        }
    }

    pub fn malformed_response(model: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::MalformedResponse {
            model: model.into(),
            detail: detail.into(),
        }
    }

    pub fn content_invalid(detail: impl Into<String>) -> Self {
        Self::ContentInvalid {
            detail: detail.into(),
        }
    }

    pub fn config_error(
        config_path: impl Into<String>,
        field: impl Into<String>,
        expected: impl Into<String>,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ConfigurationError {
            config_path: config_path.into(),
            field: field.into(),
            expected: expected.into(),
            cause: Box::new(cause),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Report;

    #[test]
    fn unknown_profile_lists_valid_tags() {
        let error = CoreError::unknown_profile("Tactile");
        let report = Report::new(error);
        let output = format!("{:?}", report);
        assert!(output.contains("unknown_profile"));
        assert!(output.contains("Visual"));
        assert!(output.contains("Kinesthetic"));
    }

    #[test]
    fn in_flight_names_the_operation() {
        let error = CoreError::in_flight("transform");
        let report = Report::new(error);
        let output = format!("{:?}", report);
        assert!(output.contains("operation_in_flight"));
        assert!(output.contains("transform"));
    }
}

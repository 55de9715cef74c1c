use thiserror::Error;

/// Structured error type for the application. Every command handler returns
/// this so `main` can print a single line and pick the exit status.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("No definitions found in {path}, exiting...")]
    EmptyDefinitionSet { path: String },

    #[error("Definition \"{name}\" not found")]
    UnknownDefinition { name: String },

    #[error("Cyclic definition: {chain}")]
    CyclicDefinition { chain: String },

    #[error("{message}")]
    Validation { message: String },

    #[error("Generation failed: {message}")]
    Generation { message: String },

    #[error("Unexpected response from model provider: {message}")]
    MalformedResponse { message: String },

    #[error("I/O error: {message}")]
    Io { message: String },

    #[error(
        "Please add API keys for either one of the models as an env variable with its respective name:\n \
         * OpenAI: \"{openai}\"\n \
         * Gemini: \"{gemini}\"",
        openai = crate::settings::OPENAI_KEY_VAR,
        gemini = crate::settings::GEMINI_KEY_VAR
    )]
    MissingCredentials,
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        AppError::MalformedResponse {
            message: message.into(),
        }
    }

    /// Errors that end the process cleanly rather than as a failure.
    pub fn is_benign(&self) -> bool {
        matches!(self, AppError::EmptyDefinitionSet { .. })
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_benign() {
            0
        } else {
            1
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io {
            message: e.to_string(),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Generation {
            message: e.to_string(),
        }
    }
}

impl From<dialoguer::Error> for AppError {
    fn from(e: dialoguer::Error) -> Self {
        AppError::Io {
            message: e.to_string(),
        }
    }
}

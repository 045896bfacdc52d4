use serde::Deserialize;

use crate::server::errors::DeployError;

/// Body of a deploy request, as sent by the caller.
///
/// Every field is optional at this stage so that missing fields produce the
/// endpoint's own validation error instead of a decoding error.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Deploy {
    /// Path of the file inside the repository.
    pub filename: Option<String>,
    /// Raw file body.
    pub content: Option<String>,
    /// Commit message.
    pub message: Option<String>,
    /// Which configured repository to write into.
    pub project: Option<String>,
    /// Shared secret.
    pub deploy_key: Option<String>,
}

/// A deploy request that passed validation.
pub struct Checked {
    /// Path of the file inside the repository. Never empty.
    pub filename: String,
    /// Raw file body. Never empty.
    pub content: String,
    /// Commit message, if the caller gave a non-empty one.
    pub message: Option<String>,
    /// Project, if the caller gave a non-empty one.
    pub project: Option<String>,
    /// Shared secret as supplied.
    pub deploy_key: Option<String>,
}

impl Deploy {
    /// Decode a raw request body.
    ///
    /// # Errors
    /// Errors if the body is not a JSON object with string (or null) fields.
    pub fn parse(body: &[u8]) -> Result<Self, DeployError> {
        serde_json::from_slice(body).map_err(|err| DeployError::InvalidBody(err.to_string()))
    }

    /// Require a non-empty `filename` and `content`; empty optional fields count as absent.
    ///
    /// # Errors
    /// Errors with [`DeployError::InvalidInput`] if `filename` or `content` is missing or empty.
    pub fn check(self) -> Result<Checked, DeployError> {
        let (Some(filename), Some(content)) = (non_empty(self.filename), non_empty(self.content))
        else {
            return Err(DeployError::InvalidInput);
        };
        Ok(Checked {
            filename,
            content,
            message: non_empty(self.message),
            project: non_empty(self.project),
            deploy_key: self.deploy_key,
        })
    }
}

/// `None` for missing or empty strings.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|found| !found.is_empty())
}

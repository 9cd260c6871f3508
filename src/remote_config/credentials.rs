use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// File name of the service-account key for `env`.
pub fn credentials_file_name(env: &str) -> String {
    format!("serviceAccount_{env}.json")
}

/// The subset of a Google service-account key file needed to mint tokens.
#[derive(Clone, Deserialize)]
pub struct ServiceAccount {
    pub project_id: String,
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    #[error("{file} not found in {}. Please create one and place it there.", .dir.display())]
    Missing { file: String, dir: PathBuf },

    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not a valid service account key: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ServiceAccount {
    /// Load `serviceAccount_<env>.json` from `dir`.
    pub fn load(dir: &Path, env: &str) -> Result<Self, CredentialsError> {
        let file = credentials_file_name(env);
        let path = dir.join(&file);

        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CredentialsError::Missing {
                    file,
                    dir: dir.to_path_buf(),
                });
            }
            Err(source) => return Err(CredentialsError::Io { path, source }),
        };

        serde_json::from_str(&raw).map_err(|source| CredentialsError::Parse { path, source })
    }
}

//! Error types for the file registry

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("File already exists: {hash}")]
    FileAlreadyExists { hash: String },

    #[error("File does not exist: {hash}")]
    FileDoesNotExist { hash: String },

    #[error("Not owner: caller does not own file {hash}")]
    NotOwner { hash: String },

    #[error("Invalid content hash: must not be empty")]
    InvalidContentHash,

    #[error("Registry storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl RegistryError {
    /// Short, stable name of the failed precondition.
    pub fn kind(&self) -> &'static str {
        match self {
            RegistryError::FileAlreadyExists { .. } => "FileAlreadyExists",
            RegistryError::FileDoesNotExist { .. } => "FileDoesNotExist",
            RegistryError::NotOwner { .. } => "NotOwner",
            RegistryError::InvalidContentHash => "InvalidContentHash",
            RegistryError::Storage(_) => "Storage",
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_hash() {
        let err = RegistryError::FileDoesNotExist {
            hash: "bafy123".to_string(),
        };
        assert_eq!(err.to_string(), "File does not exist: bafy123");
        assert_eq!(err.kind(), "FileDoesNotExist");
    }

    #[test]
    fn test_storage_error_wraps_anyhow() {
        let err: RegistryError = anyhow::anyhow!("disk full").into();
        assert_eq!(err.kind(), "Storage");
        assert!(err.to_string().contains("disk full"));
    }
}

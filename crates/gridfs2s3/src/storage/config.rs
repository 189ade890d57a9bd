use serde::{Deserialize, Serialize};

use crate::error::{MigrateError, Result};
use crate::migrate::key::KeyBuilder;

/// Default region of the destination bucket.
pub const DEFAULT_REGION: &str = "eu-central-1";

/// Default path segment placed after `<project>/<environment>`.
pub const DEFAULT_PREFIX: &str = "uploads";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    pub bucket: String,
    pub project: String,
    pub environment: String,
    /// Optional sub-prefix; empty means keys go straight under the environment
    pub prefix: String,
    pub region: String,
    /// Custom endpoint for S3-compatible stores
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    #[serde(skip_serializing)]
    pub secret_key: Option<String>,
    pub path_style: bool,
}

impl DestinationConfig {
    pub fn new(
        bucket: impl Into<String>,
        project: impl Into<String>,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            project: project.into(),
            environment: environment.into(),
            prefix: DEFAULT_PREFIX.to_string(),
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
            access_key: None,
            secret_key: None,
            path_style: false,
        }
    }

    /// Local MinIO with its stock credentials.
    pub fn for_minio(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        project: impl Into<String>,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            region: "us-east-1".to_string(),
            access_key: Some("minioadmin".to_string()),
            secret_key: Some("minioadmin".to_string()),
            path_style: true,
            ..Self::new(bucket, project, environment)
        }
    }

    /// Bucket, project and environment are mandatory.
    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            return Err(MigrateError::Config(
                "destination bucket is required (--bucket)".to_string(),
            ));
        }

        if self.project.trim().is_empty() {
            return Err(MigrateError::Config(
                "project name is required (--project)".to_string(),
            ));
        }

        if self.environment.trim().is_empty() {
            return Err(MigrateError::Config(
                "environment name is required (--env)".to_string(),
            ));
        }

        if self.access_key.is_some() != self.secret_key.is_some() {
            return Err(MigrateError::Config(
                "access key and secret key must be given together".to_string(),
            ));
        }

        Ok(())
    }

    pub fn key_builder(&self) -> KeyBuilder {
        KeyBuilder::new(&self.project, &self.environment, &self.prefix)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_defaults() {
        let config = DestinationConfig::new("media", "shop", "prod");
        assert_eq!(config.prefix, "uploads");
        assert_eq!(config.region, "eu-central-1");
        assert!(config.endpoint.is_none());
        assert!(!config.path_style);
        config.validate().unwrap();
    }

    #[test]
    fn test_for_minio() {
        let config =
            DestinationConfig::for_minio("http://localhost:9000", "test-bucket", "shop", "dev");
        assert_eq!(config.endpoint.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.bucket, "test-bucket");
        assert!(config.path_style);
        assert_eq!(config.access_key.as_deref(), Some("minioadmin"));
    }

    #[test]
    fn test_each_identifier_is_required() {
        for (bucket, project, env, missing) in [
            ("", "shop", "prod", "bucket"),
            ("media", " ", "prod", "project"),
            ("media", "shop", "", "environment"),
        ] {
            let err = DestinationConfig::new(bucket, project, env)
                .validate()
                .unwrap_err();
            assert!(err.to_string().contains(missing), "{}", err);
        }
    }

    #[test]
    fn test_half_credentials_rejected() {
        let mut config = DestinationConfig::new("media", "shop", "prod");
        config.access_key = Some("AKIA".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_key_builder_uses_prefix() {
        let config = DestinationConfig::new("media", "shop", "prod");
        assert_eq!(
            config.key_builder().key_for("logo.png"),
            "shop/prod/uploads/logo.png"
        );
    }
}

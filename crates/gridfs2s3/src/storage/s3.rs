use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::{error::DisplayErrorContext, primitives::ByteStream, Client};
use tracing::{debug, info, instrument};

use super::config::DestinationConfig;
use super::Destination;
use crate::error::{MigrateError, Result};

/// S3 (or S3-compatible) bucket receiving migrated objects
#[derive(Clone)]
pub struct S3Destination {
    client: Client,
    bucket: String,
    region: String,
    endpoint: Option<String>,
}

impl S3Destination {
    /// Build a client and check that the bucket is reachable.
    ///
    /// Credentials come from the config when present, otherwise from the
    /// default AWS provider chain.
    pub async fn connect(config: &DestinationConfig) -> Result<Self> {
        let destination = Self::new(config).await;

        destination
            .client
            .head_bucket()
            .bucket(&destination.bucket)
            .send()
            .await
            .map_err(|e| {
                MigrateError::Connection(format!(
                    "bucket {} is not reachable: {}",
                    destination.bucket,
                    DisplayErrorContext(&e)
                ))
            })?;

        info!(bucket = %destination.bucket, region = %destination.region, "Destination bucket reachable");

        Ok(destination)
    }

    /// Build a client without touching the network.
    pub async fn new(config: &DestinationConfig) -> Self {
        debug!(bucket = %config.bucket, region = %config.region, endpoint = ?config.endpoint, "Initializing S3 client");

        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));

        if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
            loader = loader.credentials_provider(Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "gridfs2s3",
            ));
        }

        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.path_style)
            .build();

        Self {
            client: Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Public URL of `key`, in the same shape S3 reports for uploads.
    pub fn object_url(&self, key: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => format!("{}/{}/{}", endpoint.trim_end_matches('/'), self.bucket, key),
            None => format!("https://{}.s3.{}.amazonaws.com/{}", self.bucket, self.region, key),
        }
    }
}

#[async_trait]
impl Destination for S3Destination {
    #[instrument(level = "debug", skip(self, body), fields(bucket = %self.bucket, size = body.len()))]
    async fn upload(&self, key: &str, body: Vec<u8>, content_type: Option<&str>) -> Result<String> {
        let size = body.len() as i64;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_length(size)
            .set_content_type(content_type.map(str::to_string))
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| MigrateError::transfer(key, DisplayErrorContext(&e)))?;

        debug!("Uploaded {} bytes to s3://{}/{}", size, self.bucket, key);

        Ok(self.object_url(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn destination(endpoint: Option<&str>) -> S3Destination {
        S3Destination {
            client: Client::from_conf(aws_sdk_s3::Config::builder().build()),
            bucket: "media-archive".to_string(),
            region: "eu-central-1".to_string(),
            endpoint: endpoint.map(str::to_string),
        }
    }

    #[test]
    fn test_aws_object_url() {
        assert_eq!(
            destination(None).object_url("shop/prod/uploads/a/b.png"),
            "https://media-archive.s3.eu-central-1.amazonaws.com/shop/prod/uploads/a/b.png"
        );
    }

    #[test]
    fn test_custom_endpoint_object_url() {
        assert_eq!(
            destination(Some("http://localhost:9000/")).object_url("shop/dev/x.txt"),
            "http://localhost:9000/media-archive/shop/dev/x.txt"
        );
    }
}

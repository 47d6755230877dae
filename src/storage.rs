use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::config::AppConfig;
use crate::error::AppError;

/// Object storage for clothing photos. Objects are publicly readable by URL.
#[derive(Clone, Debug)]
pub struct ObjectStore {
    client: Client,
    bucket: String,
    region: String,
}

impl ObjectStore {
    pub async fn from_config(config: &AppConfig) -> Self {
        let credentials = Credentials::new(
            config.aws_access_key_id.clone(),
            config.aws_secret_access_key.clone(),
            None,
            None,
            "closet-secrets",
        );
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.aws_region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        ObjectStore {
            client: Client::new(&sdk_config),
            bucket: config.s3_bucket.clone(),
            region: config.aws_region.clone(),
        }
    }

    /// A store with no credentials, for handlers that never reach S3.
    #[cfg(test)]
    pub(crate) fn offline(bucket: &str, region: &str) -> Self {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .build();

        ObjectStore {
            client: Client::from_conf(config),
            bucket: bucket.to_string(),
            region: region.to_string(),
        }
    }

    pub async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), AppError> {
        let size = bytes.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| {
                error!("Failed to upload {} to bucket {}: {}", key, self.bucket, e);
                AppError::TransientIo("Failed to upload image".to_string())
            })?;

        info!("Uploaded {} ({} bytes)", key, size);
        Ok(())
    }

    pub fn public_url(&self, key: &str) -> String {
        public_url(&self.bucket, &self.region, key)
    }
}

pub fn public_url(bucket: &str, region: &str, key: &str) -> String {
    format!("https://{}.s3.{}.amazonaws.com/{}", bucket, region, key)
}

/// Keeps the last path segment of a client-supplied name and replaces
/// anything outside `[A-Za-z0-9._-]`.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

pub fn object_key(user_id: &str, filename: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}/{}-{}",
        user_id,
        now.timestamp_millis(),
        sanitize_filename(filename)
    )
}

/// Content type guessed from the file extension.
pub fn content_type_for(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        "avif" => "image/avif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn filenames_are_sanitized() {
        assert_eq!(sanitize_filename("red dress.JPG"), "red-dress.JPG");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\photos\\coat.png"), "coat.png");
        assert_eq!(sanitize_filename("..."), "upload");
        assert_eq!(sanitize_filename(""), "upload");
    }

    #[test]
    fn keys_are_scoped_by_user_and_time() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let key = object_key("user_42", "my jacket.png", now);

        assert_eq!(key, format!("user_42/{}-my-jacket.png", now.timestamp_millis()));
    }

    #[test]
    fn public_url_uses_virtual_hosted_style() {
        assert_eq!(
            public_url("closet-images", "eu-west-1", "u/1-a.png"),
            "https://closet-images.s3.eu-west-1.amazonaws.com/u/1-a.png"
        );
    }

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(content_type_for("a.JPEG"), "image/jpeg");
        assert_eq!(content_type_for("a.webp"), "image/webp");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }
}

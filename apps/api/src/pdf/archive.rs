use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::config::S3Settings;
use crate::errors::AppError;

/// Keeps a copy of every rendered offer letter in S3 (or MinIO locally).
#[derive(Clone)]
pub struct PdfArchive {
    s3: S3Client,
    bucket: String,
}

impl PdfArchive {
    /// Constructs an S3 client configured for MinIO (local) or AWS (production).
    pub async fn connect(settings: &S3Settings) -> Self {
        let credentials = Credentials::new(
            &settings.access_key_id,
            &settings.secret_access_key,
            None,
            None,
            "offerdesk-static",
        );

        let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(credentials)
            .endpoint_url(&settings.endpoint)
            .load()
            .await;

        Self {
            s3: S3Client::new(&s3_config),
            bucket: settings.bucket.clone(),
        }
    }

    /// Stores the PDF and returns its object key.
    pub async fn store(&self, offer_letter_id: Uuid, pdf: Bytes) -> Result<String, AppError> {
        let key = archive_key(offer_letter_id);
        self.s3
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(pdf))
            .content_type("application/pdf")
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 upload failed: {e}")))?;

        info!("Archived offer letter PDF to s3://{}/{}", self.bucket, key);
        Ok(key)
    }
}

pub fn archive_key(offer_letter_id: Uuid) -> String {
    format!("offer-letters/{offer_letter_id}.pdf")
}

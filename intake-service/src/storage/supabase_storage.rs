// Supabase Storage implementation of the object store

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;

use super::{ObjectStore, StorageError};
use crate::supabase::{self, SupabaseClient};

pub struct SupabaseStorage {
    client: SupabaseClient,
}

impl SupabaseStorage {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    fn check_key(key: &str) -> Result<(), StorageError> {
        if key.is_empty() || key.starts_with('/') || key.split('/').any(|part| part == "..") {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for SupabaseStorage {
    async fn store(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        Self::check_key(key)?;

        let size = data.len();
        let response = self
            .client
            .post(&format!("/storage/v1/object/{}/{}", bucket, key))
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(data)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = supabase::error_message(response).await;
            tracing::error!("Storage upload of {}/{} failed ({}): {}", bucket, key, status, message);
            return Err(StorageError::Rejected { status, message });
        }

        tracing::debug!("Stored {} bytes at {}/{}", size, bucket, key);
        Ok(())
    }

    fn resolve_public_url(&self, bucket: &str, key: &str) -> Result<String, StorageError> {
        Self::check_key(key)?;

        Ok(format!(
            "{}/storage/v1/object/public/{}/{}",
            self.client.base_url(),
            bucket,
            key
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SupabaseConfig;
    use crate::storage::UPLOADS_BUCKET;

    fn storage_for(url: &str) -> SupabaseStorage {
        let client = SupabaseClient::new(&SupabaseConfig {
            url: url.to_string(),
            anon_key: "anon-key".to_string(),
        })
        .unwrap();
        SupabaseStorage::new(client)
    }

    #[tokio::test]
    async fn test_store_sends_bytes_with_credentials() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/storage/v1/object/uploads/2026/10/16/abc.jpg")
            .match_header("apikey", "anon-key")
            .match_header("authorization", "Bearer anon-key")
            .match_header("content-type", "image/png")
            .match_header("x-upsert", "false")
            .match_body("png-bytes")
            .with_status(200)
            .with_body(r#"{"Key":"uploads/2026/10/16/abc.jpg"}"#)
            .create_async()
            .await;

        let storage = storage_for(&server.url());
        storage
            .store(
                UPLOADS_BUCKET,
                "2026/10/16/abc.jpg",
                Bytes::from_static(b"png-bytes"),
                "image/png",
            )
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_store_surfaces_backend_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/storage/v1/object/uploads/k.jpg")
            .with_status(400)
            .with_body(r#"{"statusCode":"403","error":"Unauthorized","message":"new row violates row-level security policy"}"#)
            .create_async()
            .await;

        let err = storage_for(&server.url())
            .store(UPLOADS_BUCKET, "k.jpg", Bytes::from_static(b"x"), "image/jpeg")
            .await
            .unwrap_err();

        match err {
            StorageError::Rejected { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "new row violates row-level security policy");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_store_rejects_bad_key_without_request() {
        let storage = storage_for("http://127.0.0.1:9");
        let err = storage
            .store(UPLOADS_BUCKET, "../escape.jpg", Bytes::new(), "image/jpeg")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }

    #[test]
    fn test_public_url_is_derived_from_key() {
        let storage = storage_for("https://demo.supabase.co/");
        let url = storage
            .resolve_public_url(UPLOADS_BUCKET, "2026/10/16/abc.jpg")
            .unwrap();

        assert_eq!(
            url,
            "https://demo.supabase.co/storage/v1/object/public/uploads/2026/10/16/abc.jpg"
        );
    }
}

//! Object storage gateway: presigned uploads and prefix-scoped deletion.
//!
//! Binaries never pass through this service.  Clients receive a short-lived
//! signed PUT URL, upload directly to the bucket, and hand the resulting
//! public URL back to the image operations.  Object keys follow the
//! `{album_id}-{unix_millis}-{sanitized_file_name}` convention; the
//! `{album_id}-` prefix is the only way album deletion finds the album's
//! binaries, so it is a bit-exact contract, not a naming preference.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};

/// Time-boxed write access to a bucket, plus deletion keyed by object or
/// prefix.  Errors are provider messages; callers wrap them into their own
/// taxonomy.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Issue a signed PUT URL for `key` expiring after `expires_in`.
    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<String, String>;

    /// Delete a single object.
    async fn delete_object(&self, key: &str) -> Result<(), String>;

    /// Delete every object whose key starts with `prefix`.  An empty
    /// listing is a no-op success.  Returns the number of objects removed.
    async fn delete_prefix(&self, prefix: &str) -> Result<usize, String>;

    /// The long-lived public read URL for `key`.
    fn public_url(&self, key: &str) -> String;
}

// ---------------------------------------------------------------------------
// Object key convention
// ---------------------------------------------------------------------------

/// Replace every byte outside `[A-Za-z0-9._-]` with `_`.
///
/// `"My Photo.png"` becomes `"My_Photo.png"`.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Build the object key for one upload:
/// `{album_id}-{unix_millis}-{sanitized_file_name}`.
pub fn build_object_key(album_id: &str, unix_millis: u64, file_base_name: &str) -> String {
    format!(
        "{album_id}-{unix_millis}-{}",
        sanitize_file_name(file_base_name)
    )
}

/// Parse the object key back out of a public URL.  Keys never contain `/`,
/// so the key is everything after the final slash.
pub fn object_key_from_url(url: &str) -> Option<&str> {
    let (_, key) = url.rsplit_once('/')?;
    if key.is_empty() {
        return None;
    }
    Some(key)
}

// ---------------------------------------------------------------------------
// S3 backend
// ---------------------------------------------------------------------------

/// S3-backed store.  One client for the process lifetime, injected at
/// startup.
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    region: String,
}

impl S3ObjectStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            region: region.into(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<String, String> {
        let config = PresigningConfig::expires_in(expires_in)
            .map_err(|e| format!("invalid presign expiry: {e}"))?;
        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .presigned(config)
            .await
            .map_err(|e| format!("presign PUT failed: {e}"))?;
        Ok(presigned.uri().to_string())
    }

    async fn delete_object(&self, key: &str) -> Result<(), String> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| format!("delete object failed: {e}"))?;
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<usize, String> {
        let mut removed = 0usize;
        let mut continuation: Option<String> = None;

        loop {
            let listing = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|e| format!("list objects failed: {e}"))?;

            let keys: Vec<String> = listing
                .contents()
                .iter()
                .filter_map(|o| o.key().map(str::to_string))
                .collect();

            if !keys.is_empty() {
                let identifiers = keys
                    .iter()
                    .map(|k| ObjectIdentifier::builder().key(k).build())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| format!("bad object identifier: {e}"))?;
                let delete = Delete::builder()
                    .set_objects(Some(identifiers))
                    .build()
                    .map_err(|e| format!("bad delete request: {e}"))?;
                self.client
                    .delete_objects()
                    .bucket(&self.bucket)
                    .delete(delete)
                    .send()
                    .await
                    .map_err(|e| format!("bulk delete failed: {e}"))?;
                removed += keys.len();
            }

            match listing.next_continuation_token() {
                Some(token) => continuation = Some(token.to_string()),
                None => break,
            }
        }

        Ok(removed)
    }

    fn public_url(&self, key: &str) -> String {
        format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            self.bucket, self.region, key
        )
    }
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MemoryInner {
    /// key -> content type
    objects: BTreeMap<String, String>,
    presigned: Vec<(String, String)>,
    deleted_objects: Vec<String>,
    deleted_prefixes: Vec<String>,
}

/// In-memory store for tests and credential-less local runs.  Records every
/// call so tests can assert on the prefixes bulk deletion was scoped to.
pub struct MemoryObjectStore {
    bucket: String,
    region: String,
    inner: Mutex<MemoryInner>,
}

impl MemoryObjectStore {
    pub fn new(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
            inner: Mutex::new(MemoryInner::default()),
        }
    }

    /// Seed an object, as if a client had completed its presigned upload.
    pub fn put(&self, key: &str, content_type: &str) {
        self.inner
            .lock()
            .unwrap()
            .objects
            .insert(key.to_string(), content_type.to_string());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().unwrap().objects.contains_key(key)
    }

    pub fn presigned_keys(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .presigned
            .iter()
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub fn deleted_objects(&self) -> Vec<String> {
        self.inner.lock().unwrap().deleted_objects.clone()
    }

    pub fn deleted_prefixes(&self) -> Vec<String> {
        self.inner.lock().unwrap().deleted_prefixes.clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<String, String> {
        let mut inner = self.inner.lock().unwrap();
        inner.presigned.push((key.to_string(), content_type.to_string()));
        Ok(format!(
            "https://{}.s3.{}.amazonaws.com/{}?X-Amz-Expires={}&X-Amz-Signature=local",
            self.bucket,
            self.region,
            key,
            expires_in.as_secs()
        ))
    }

    async fn delete_object(&self, key: &str) -> Result<(), String> {
        let mut inner = self.inner.lock().unwrap();
        inner.objects.remove(key);
        inner.deleted_objects.push(key.to_string());
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<usize, String> {
        let mut inner = self.inner.lock().unwrap();
        inner.deleted_prefixes.push(prefix.to_string());
        let keys: Vec<String> = inner
            .objects
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        for key in &keys {
            inner.objects.remove(key);
        }
        Ok(keys.len())
    }

    fn public_url(&self, key: &str) -> String {
        format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            self.bucket, self.region, key
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_spaces_and_punctuation() {
        assert_eq!(sanitize_file_name("My Photo.png"), "My_Photo.png");
        assert_eq!(sanitize_file_name("pier (edit)!.jpg"), "pier__edit__.jpg");
        assert_eq!(sanitize_file_name("safe-name_1.webp"), "safe-name_1.webp");
    }

    #[test]
    fn object_key_carries_album_prefix() {
        let key = build_object_key("A123", 1_700_000_000_123, "My Photo.png");
        assert_eq!(key, "A123-1700000000123-My_Photo.png");
        assert!(key.starts_with("A123-"));
    }

    #[test]
    fn key_round_trips_through_public_url() {
        let store = MemoryObjectStore::new("portfolio", "us-east-1");
        let key = build_object_key("alb-9", 42, "pier.jpg");
        let url = store.public_url(&key);
        assert_eq!(url, "https://portfolio.s3.us-east-1.amazonaws.com/alb-9-42-pier.jpg");
        assert_eq!(object_key_from_url(&url), Some(key.as_str()));
        assert_eq!(object_key_from_url("not a url"), None);
    }

    #[tokio::test]
    async fn delete_prefix_on_empty_listing_is_a_noop_success() {
        let store = MemoryObjectStore::new("portfolio", "us-east-1");
        let removed = store.delete_prefix("alb-1-").await.unwrap();
        assert_eq!(removed, 0);
        assert_eq!(store.deleted_prefixes(), vec!["alb-1-".to_string()]);
    }

    #[tokio::test]
    async fn delete_prefix_removes_only_matching_objects() {
        let store = MemoryObjectStore::new("portfolio", "us-east-1");
        store.put("alb-1-1-a.png", "image/png");
        store.put("alb-1-2-b.png", "image/png");
        store.put("alb-2-1-c.png", "image/png");

        let removed = store.delete_prefix("alb-1-").await.unwrap();
        assert_eq!(removed, 2);
        assert!(!store.contains("alb-1-1-a.png"));
        assert!(store.contains("alb-2-1-c.png"));
    }
}

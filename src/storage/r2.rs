//! Cloudflare R2 (and other S3-compatible) client

use crate::config::StorageCredentials;
use crate::storage::sigv4::{self, CanonicalRequest};
use crate::storage::{ObjectStore, PutObject, StorageError, StorageResult};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use std::time::Duration;

/// Path-style S3 client signing every request with SigV4
pub struct R2Client {
    client: Client,
    credentials: StorageCredentials,
    timeout: Duration,
}

impl R2Client {
    pub fn new(client: Client, credentials: StorageCredentials, timeout: Duration) -> Self {
        tracing::debug!(
            "Object store at {} (region {})",
            credentials.endpoint,
            credentials.region
        );
        Self {
            client,
            credentials,
            timeout,
        }
    }

    /// The bucket named in the credentials
    pub fn bucket(&self) -> &str {
        &self.credentials.bucket
    }

    fn host_header(&self) -> StorageResult<String> {
        let endpoint = &self.credentials.endpoint;
        let host = endpoint.host_str().ok_or_else(|| {
            StorageError::NotConfigured(format!("endpoint '{}' has no host", endpoint))
        })?;
        Ok(match endpoint.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        })
    }

    /// Absolute path of an object: `/<bucket>/<key>` below the endpoint path
    fn object_path(&self, bucket: &str, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.credentials.endpoint.path().trim_end_matches('/'),
            bucket,
            sigv4::encode_key(key)
        )
    }
}

#[async_trait]
impl ObjectStore for R2Client {
    async fn put_object(&self, object: PutObject<'_>) -> StorageResult<()> {
        let key = object.key;
        let now = Utc::now();
        let amz_date = sigv4::amz_date(now);
        let payload_hash = sigv4::hash_payload(&object.body);
        let path = self.object_path(object.bucket, key);
        let host = self.host_header()?;

        let request = CanonicalRequest {
            method: "PUT",
            path: &path,
            headers: vec![
                ("content-type".to_string(), object.content_type.to_string()),
                ("host".to_string(), host.clone()),
                ("x-amz-acl".to_string(), object.acl.as_header().to_string()),
                ("x-amz-content-sha256".to_string(), payload_hash.clone()),
                ("x-amz-date".to_string(), amz_date.clone()),
            ],
            payload_hash: &payload_hash,
        };
        let authorization = sigv4::authorization(
            &request,
            &self.credentials.access_key,
            &self.credentials.secret_key,
            &self.credentials.region,
            now,
        )?;

        let url = format!(
            "{}://{}{}",
            self.credentials.endpoint.scheme(),
            host,
            path
        );
        tracing::debug!("PUT {} ({} bytes)", url, object.body.len());

        let response = self
            .client
            .put(&url)
            .timeout(self.timeout)
            .header("content-type", object.content_type)
            .header("x-amz-acl", object.acl.as_header())
            .header("x-amz-content-sha256", payload_hash.as_str())
            .header("x-amz-date", amz_date.as_str())
            .header("authorization", authorization)
            .body(object.body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    StorageError::Timeout {
                        key: key.to_string(),
                    }
                } else {
                    StorageError::Transport {
                        key: key.to_string(),
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Status {
                key: key.to_string(),
                status: status.as_u16(),
                body: body.chars().take(512).collect(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ObjectAcl;
    use url::Url;
    use wiremock::matchers::{body_string, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> R2Client {
        let credentials = StorageCredentials {
            endpoint: Url::parse(&server.uri()).unwrap(),
            access_key: "AKID".to_string(),
            secret_key: "secret".to_string(),
            bucket: "docs".to_string(),
            region: "auto".to_string(),
        };
        R2Client::new(Client::new(), credentials, Duration::from_secs(5))
    }

    fn object<'a>(key: &'a str, body: &str) -> PutObject<'a> {
        PutObject {
            bucket: "docs",
            key,
            body: body.as_bytes().to_vec(),
            content_type: "text/markdown",
            acl: ObjectAcl::PublicRead,
        }
    }

    #[tokio::test]
    async fn test_put_object_signed_path_style() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/docs/guide/intro.md"))
            .and(header("x-amz-acl", "public-read"))
            .and(header("content-type", "text/markdown"))
            .and(header_exists("x-amz-date"))
            .and(header_exists("x-amz-content-sha256"))
            .and(header_exists("authorization"))
            .and(body_string("# Intro"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        client
            .put_object(object("guide/intro.md", "# Intro"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_rejected_upload_reports_key_and_status() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(403).set_body_string("AccessDenied"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .put_object(object("index.md", "x"))
            .await
            .unwrap_err();

        match err {
            StorageError::Status { key, status, body } => {
                assert_eq!(key, "index.md");
                assert_eq!(status, 403);
                assert!(body.contains("AccessDenied"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_slow_store_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let mut client = client_for(&server);
        client.timeout = Duration::from_millis(200);

        let err = client
            .put_object(object("index.md", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Timeout { .. }));
    }

    #[test]
    fn test_object_path_encodes_key() {
        let credentials = StorageCredentials {
            endpoint: Url::parse("https://acct.r2.cloudflarestorage.com").unwrap(),
            access_key: "a".into(),
            secret_key: "s".into(),
            bucket: "docs".into(),
            region: "auto".into(),
        };
        let client = R2Client::new(Client::new(), credentials, Duration::from_secs(1));

        assert_eq!(client.object_path("docs", "a b.md"), "/docs/a%20b.md");
        assert_eq!(client.host_header().unwrap(), "acct.r2.cloudflarestorage.com");
        assert_eq!(client.bucket(), "docs");
    }
}

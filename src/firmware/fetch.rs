use std::{fmt, path::Path};

use log::{debug, info};
use reqwest::{header, Client, RequestBuilder};

use crate::error::FetchError;

/// Environment variable holding the release download token
pub const TOKEN_ENV: &str = "FRONTEND_TOKEN";

/// A bearer token for release downloads. Never empty; `Debug` hides it.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let value = value.trim();

        if value.is_empty() {
            None
        } else {
            Some(ApiToken(value.to_string()))
        }
    }

    /// `None` if the variable is unset, not unicode, or blank
    pub fn from_env(var: &str) -> Option<Self> {
        std::env::var(var).ok().and_then(ApiToken::new)
    }

    fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(<redacted>)")
    }
}

/// GET for the archive. Without a token the request goes out anonymously.
pub fn frontend_request(client: &Client, url: &str, token: Option<&ApiToken>) -> RequestBuilder {
    let request = client
        .get(url)
        .header(header::ACCEPT, "application/octet-stream");

    match token {
        Some(token) => request.bearer_auth(token.secret()),
        None => {
            debug!("No token for {}, requesting anonymously", url);
            request
        }
    }
}

/// Download the archive at `url` into `dest`. Returns the number of bytes
/// written.
pub async fn fetch_frontend(
    client: &Client,
    url: &str,
    token: Option<&ApiToken>,
    dest: &Path,
) -> Result<u64, FetchError> {
    let response = frontend_request(client, url, token).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status,
        });
    }

    let body = response.bytes().await?;
    tokio::fs::write(dest, &body).await?;

    info!("Saved {} bytes from {} to {}", body.len(), url, dest.display());
    Ok(body.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        task::JoinHandle,
    };

    /// Answer a single request, handing back the raw request head
    async fn serve_once(status_line: &'static str, body: &'static [u8]) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/frontend.tar.gz", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                if n == 0 || request.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }

            let head = format!(
                "{}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status_line,
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(body).await.unwrap();

            String::from_utf8_lossy(&request).to_ascii_lowercase()
        });

        (url, handle)
    }

    fn client() -> Client {
        Client::builder().no_proxy().build().unwrap()
    }

    fn temp_dest(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("antctl-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_token_states() {
        assert_eq!(None, ApiToken::new(""));
        assert_eq!(None, ApiToken::new("   \n"));
        assert_eq!(Some(ApiToken("abc".to_string())), ApiToken::new(" abc\n"));
        assert_eq!("ApiToken(<redacted>)", format!("{:?}", ApiToken::new("abc").unwrap()));
    }

    #[test]
    fn test_token_from_env() {
        std::env::set_var("ANTCTL_TEST_TOKEN_SET", "s3cret");
        std::env::set_var("ANTCTL_TEST_TOKEN_BLANK", "");

        assert_eq!(ApiToken::new("s3cret"), ApiToken::from_env("ANTCTL_TEST_TOKEN_SET"));
        assert_eq!(None, ApiToken::from_env("ANTCTL_TEST_TOKEN_BLANK"));
        assert_eq!(None, ApiToken::from_env("ANTCTL_TEST_TOKEN_UNSET"));
    }

    #[test]
    fn test_auth_header_only_with_token() {
        let client = client();
        let token = ApiToken::new("s3cret");

        let request = frontend_request(&client, "http://localhost/a.tgz", token.as_ref())
            .build()
            .unwrap();
        assert_eq!(
            "Bearer s3cret",
            request.headers()[header::AUTHORIZATION].to_str().unwrap()
        );

        let request = frontend_request(&client, "http://localhost/a.tgz", None)
            .build()
            .unwrap();
        assert!(request.headers().get(header::AUTHORIZATION).is_none());
        assert_eq!(
            "application/octet-stream",
            request.headers()[header::ACCEPT].to_str().unwrap()
        );
    }

    #[tokio::test]
    async fn test_fetch_writes_archive() {
        let (url, server) = serve_once("HTTP/1.1 200 OK", b"archive").await;
        let dest = temp_dest("frontend.tar.gz");
        let token = ApiToken::new("s3cret");

        let written = fetch_frontend(&client(), &url, token.as_ref(), &dest)
            .await
            .unwrap();

        assert_eq!(7, written);
        assert_eq!(b"archive".to_vec(), std::fs::read(&dest).unwrap());
        assert!(server.await.unwrap().contains("authorization: bearer s3cret"));
        std::fs::remove_file(&dest).ok();
    }

    #[tokio::test]
    async fn test_fetch_rejects_error_status() {
        let (url, server) = serve_once("HTTP/1.1 404 Not Found", b"").await;
        let dest = temp_dest("missing.tar.gz");

        let err = fetch_frontend(&client(), &url, None, &dest).await.unwrap_err();

        assert!(matches!(
            err,
            FetchError::Status { status, .. } if status == reqwest::StatusCode::NOT_FOUND
        ));
        assert!(!server.await.unwrap().contains("authorization"));
        assert!(!dest.exists());
    }
}

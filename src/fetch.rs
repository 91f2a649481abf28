use std::path::Path;

use reqwest::blocking::{Client, ClientBuilder};
use tracing::info;

use crate::error::{Result, ScrapeError};

/// Response body of the countdown page, untouched.
#[derive(Debug, Clone)]
pub struct RawPage {
    pub source: String,
    pub body: Vec<u8>,
}

impl RawPage {
    #[cfg(test)]
    pub fn from_bytes(body: Vec<u8>) -> Self {
        RawPage {
            source: String::from("<memory>"),
            body,
        }
    }

    /// Load a page saved by an earlier run.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let body = std::fs::read(path).map_err(|e| ScrapeError::io(path, e))?;
        info!("Loaded {} ({} bytes)", path.display(), body.len());
        Ok(RawPage {
            source: path.display().to_string(),
            body,
        })
    }

    /// Write the body verbatim, for inspecting what the extractor saw.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, &self.body).map_err(|e| ScrapeError::io(path, e))?;
        info!("Saved page snapshot to {}", path.display());
        Ok(())
    }
}

pub struct Fetcher {
    client: Client,
}

/// Blocking client without the default 30s request timeout. A slow page is
/// waited for, never cut off.
fn client_builder() -> ClientBuilder {
    Client::builder().timeout(None)
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        Ok(Fetcher::with_client(client_builder().build()?))
    }

    pub fn with_client(client: Client) -> Self {
        Fetcher { client }
    }

    /// One GET, no retries. Anything but a 2xx aborts.
    ///
    /// The body is decoded with the charset from `Content-Type` (UTF-8 when
    /// absent) and kept as UTF-8 from here on, snapshots included.
    pub fn fetch(&self, url: &str) -> Result<RawPage> {
        info!("Fetching {}", url);
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status,
            });
        }
        let body = response.text()?.into_bytes();
        info!("Received {} bytes ({})", body.len(), status);
        Ok(RawPage {
            source: url.to_string(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    struct Canned {
        status_line: &'static str,
        content_type: &'static str,
        body: Vec<u8>,
        delay: Duration,
    }

    impl Canned {
        fn html(status_line: &'static str, body: &str) -> Self {
            Canned {
                status_line,
                content_type: "text/html",
                body: body.as_bytes().to_vec(),
                delay: Duration::ZERO,
            }
        }
    }

    /// Serve exactly one canned response on a loopback port.
    fn serve_once(canned: Canned) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf);
            thread::sleep(canned.delay);
            let head = format!(
                "{}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                canned.status_line,
                canned.content_type,
                canned.body.len()
            );
            stream.write_all(head.as_bytes()).unwrap();
            stream.write_all(&canned.body).unwrap();
        });
        format!("http://{}/guide", addr)
    }

    fn fetcher() -> Fetcher {
        Fetcher::with_client(client_builder().no_proxy().build().unwrap())
    }

    #[test]
    fn returns_body_on_success() {
        let url = serve_once(Canned::html("HTTP/1.1 200 OK", "<html><body>ok</body></html>"));
        let page = fetcher().fetch(&url).unwrap();
        assert_eq!(page.body, b"<html><body>ok</body></html>");
        assert_eq!(page.source, url);
    }

    #[test]
    fn non_success_status_is_fatal() {
        let url = serve_once(Canned::html("HTTP/1.1 404 Not Found", "gone"));
        let err = fetcher().fetch(&url).unwrap_err();
        match err {
            ScrapeError::Status { status, .. } => assert_eq!(status.as_u16(), 404),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn slow_response_is_waited_for() {
        // Longer than reqwest's default 30s request timeout.
        let url = serve_once(Canned {
            delay: Duration::from_secs(32),
            ..Canned::html("HTTP/1.1 200 OK", "<p>late</p>")
        });
        let page = fetcher().fetch(&url).unwrap();
        assert_eq!(page.body, b"<p>late</p>");
    }

    #[test]
    fn body_is_decoded_from_declared_charset() {
        let url = serve_once(Canned {
            content_type: "text/html; charset=iso-8859-1",
            body: b"<p>Am\xe9lie</p>".to_vec(),
            ..Canned::html("HTTP/1.1 200 OK", "")
        });
        let page = fetcher().fetch(&url).unwrap();
        assert_eq!(String::from_utf8(page.body).unwrap(), "<p>Amélie</p>");
    }

    #[test]
    fn snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        let page = RawPage::from_bytes(b"<p>hi</p>".to_vec());
        page.save(&path).unwrap();
        let loaded = RawPage::from_file(&path).unwrap();
        assert_eq!(loaded.body, page.body);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = RawPage::from_file("tests/fixtures/does-not-exist.html").unwrap_err();
        assert!(err.to_string().contains("does-not-exist.html"));
    }
}

//! Downloading and unpacking toolchain archives.
//!
//! [`Transfer`] is the primitive the install coordinator calls once it has
//! decided a directory is out of date. [`HttpArchiveTransfer`] implements it
//! for `http(s)://` and `file://` URLs:
//!
//! 1. The source's modification stamp (`Last-Modified` for HTTP, the file's
//!    mtime for local files) is compared with the `.timestamp` file in the
//!    target directory. If they are equal nothing is done and `false` is
//!    returned.
//! 2. Otherwise the message is reported, the archive is downloaded to a
//!    sibling temporary file in a single attempt, the target directory is
//!    emptied and the archive is extracted into it.
//! 3. The new stamp is written to `.timestamp` and `true` is returned.
//!
//! The HTTP client bounds only the connection phase; a slow but progressing
//! download is never cut off.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};

use anyhow::{Context, Result, bail};
use futures_util::StreamExt;
use reqwest::StatusCode;
use reqwest::header::{HeaderValue, IF_MODIFIED_SINCE, LAST_MODIFIED};
use tokio::io::AsyncWriteExt;

use crate::archive::extract_archive;
use crate::sink::LogSink;

/// Name of the file holding the source's modification stamp.
pub const TIMESTAMP_FILE: &str = ".timestamp";

/// Connection timeout in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// User-Agent header for HTTP requests.
const USER_AGENT: &str = "gois-toolchain-installer";

/// Fetches an archive and unpacks it into a directory.
pub trait Transfer: Send + Sync {
    /// Installs the archive at `url` into `dir` unless `dir` already holds it.
    ///
    /// `message` is reported to `sink` before anything is unpacked. Returns
    /// `true` if the directory was (re)populated, `false` if the source was
    /// unchanged and nothing was done.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive cannot be fetched or unpacked.
    fn install_if_necessary_from(
        &self,
        url: &str,
        dir: &Path,
        sink: &dyn LogSink,
        message: &str,
    ) -> impl Future<Output = Result<bool>> + Send;
}

/// Downloads archives over HTTP(S) or copies them from `file://` URLs.
#[derive(Debug, Clone)]
pub struct HttpArchiveTransfer {
    connect_timeout: Duration,
}

impl Default for HttpArchiveTransfer {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
        }
    }
}

impl HttpArchiveTransfer {
    /// Creates a transfer with the default connection timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn install_from_http(
        &self,
        url: &str,
        dir: &Path,
        sink: &dyn LogSink,
        message: &str,
    ) -> Result<bool> {
        let client = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;

        let previous = read_timestamp(dir).await;
        let mut request = client.get(url);
        if let Some(stamp) = previous.as_deref()
            && let Ok(value) = HeaderValue::from_str(stamp)
        {
            request = request.header(IF_MODIFIED_SINCE, value);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to connect to {url}"))?;

        if response.status() == StatusCode::NOT_MODIFIED {
            tracing::debug!(url, "server reports archive not modified");
            return Ok(false);
        }
        if !response.status().is_success() {
            bail!("HTTP error {}: {url}", response.status());
        }

        let last_modified = response
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if last_modified.is_some() && last_modified == previous {
            tracing::debug!(url, "Last-Modified unchanged, skipping download");
            return Ok(false);
        }

        sink.line(message);

        let download = download_path(dir)?;
        let result = async {
            download_to(response, &download, url).await?;
            unpack_into(&download, url, dir, last_modified.as_deref()).await
        }
        .await;
        let _ = tokio::fs::remove_file(&download).await;
        result?;

        Ok(true)
    }
}

impl Transfer for HttpArchiveTransfer {
    async fn install_if_necessary_from(
        &self,
        url: &str,
        dir: &Path,
        sink: &dyn LogSink,
        message: &str,
    ) -> Result<bool> {
        if url.starts_with("file:") {
            let source = reqwest::Url::parse(url)
                .ok()
                .and_then(|u| u.to_file_path().ok())
                .with_context(|| format!("Invalid file URL: {url}"))?;
            return install_from_file(&source, url, dir, sink, message).await;
        }
        self.install_from_http(url, dir, sink, message).await
    }
}

async fn install_from_file(
    source: &Path,
    url: &str,
    dir: &Path,
    sink: &dyn LogSink,
    message: &str,
) -> Result<bool> {
    let metadata = tokio::fs::metadata(source)
        .await
        .with_context(|| format!("Failed to read {}", source.display()))?;
    let stamp = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis().to_string());

    if stamp.is_some() && stamp == read_timestamp(dir).await {
        tracing::debug!(url, dir = %dir.display(), "source unchanged, skipping unpack");
        return Ok(false);
    }

    sink.line(message);
    unpack_into(source, url, dir, stamp.as_deref()).await?;
    Ok(true)
}

async fn read_timestamp(dir: &Path) -> Option<String> {
    tokio::fs::read_to_string(dir.join(TIMESTAMP_FILE))
        .await
        .ok()
        .map(|s| s.trim().to_string())
}

/// Returns the temporary download location next to `dir`.
fn download_path(dir: &Path) -> Result<PathBuf> {
    let name = dir
        .file_name()
        .with_context(|| format!("Installation directory has no name: {}", dir.display()))?
        .to_string_lossy();
    let parent = dir
        .parent()
        .with_context(|| format!("Installation directory has no parent: {}", dir.display()))?;
    Ok(parent.join(format!(".{name}.download")))
}

async fn download_to(response: reqwest::Response, dest: &Path, url: &str) -> Result<()> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let mut file = tokio::fs::File::create(dest)
        .await
        .with_context(|| format!("Failed to create file: {}", dest.display()))?;

    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.with_context(|| format!("Failed to read chunk from {url}"))?;
        file.write_all(&chunk)
            .await
            .with_context(|| format!("Failed to write to {}", dest.display()))?;
        downloaded += chunk.len() as u64;
    }

    file.flush()
        .await
        .with_context(|| format!("Failed to flush {}", dest.display()))?;

    tracing::info!(url, bytes = downloaded, "downloaded archive");
    Ok(())
}

/// Replaces the contents of `dir` with the extracted archive.
async fn unpack_into(archive: &Path, url: &str, dir: &Path, stamp: Option<&str>) -> Result<()> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to clear {}", dir.display()));
        }
    }
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let archive = archive.to_path_buf();
    let name = url.to_string();
    let dest = dir.to_path_buf();
    tokio::task::spawn_blocking(move || extract_archive(&archive, &name, &dest))
        .await
        .context("Extraction task panicked")??;

    if let Some(stamp) = stamp {
        tokio::fs::write(dir.join(TIMESTAMP_FILE), stamp)
            .await
            .with_context(|| format!("Failed to write timestamp in {}", dir.display()))?;
    }

    tracing::debug!(url, dir = %dir.display(), "unpacked archive");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::fmt::Write as _;
    use std::sync::{Arc, Mutex};
    use std::time::SystemTime;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    const STAMP: &str = "Tue, 02 Jul 2024 18:00:00 GMT";

    fn write_go_archive(path: &Path, version: &str) {
        let file = std::fs::File::create(path).expect("Should create archive");
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        let mut header = tar::Header::new_gnu();
        header.set_size(version.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "go/VERSION", version.as_bytes())
            .expect("Should append file");
        builder
            .into_inner()
            .expect("Should finish tar")
            .finish()
            .expect("Should finish gzip");
    }

    fn file_url(path: &Path) -> String {
        reqwest::Url::from_file_path(path)
            .expect("Should build file URL")
            .to_string()
    }

    fn set_mtime(path: &Path, secs: u64) {
        let file = std::fs::File::options()
            .write(true)
            .open(path)
            .expect("Should open archive");
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
            .expect("Should set mtime");
    }

    #[tokio::test]
    async fn unpacks_local_archive_and_reports_message() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let archive = temp.path().join("go1.22.5.linux-amd64.tar.gz");
        write_go_archive(&archive, "go1.22.5");
        let dir = temp.path().join("tools/go/default");
        let sink = MemorySink::new();

        let installed = HttpArchiveTransfer::new()
            .install_if_necessary_from(&file_url(&archive), &dir, &sink, "Unpacking")
            .await
            .expect("Should install");

        assert!(installed);
        assert_eq!(sink.lines(), vec!["Unpacking"]);
        assert_eq!(
            std::fs::read_to_string(dir.join("go/VERSION")).expect("Should read"),
            "go1.22.5"
        );
        assert!(dir.join(TIMESTAMP_FILE).is_file());
    }

    #[tokio::test]
    async fn unchanged_source_is_skipped() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let archive = temp.path().join("go.tar.gz");
        write_go_archive(&archive, "go1.22.5");
        set_mtime(&archive, 1_700_000_000);
        let dir = temp.path().join("go");
        let url = file_url(&archive);
        let transfer = HttpArchiveTransfer::new();

        let first = transfer
            .install_if_necessary_from(&url, &dir, &MemorySink::new(), "Unpacking")
            .await
            .expect("Should install");
        let sink = MemorySink::new();
        let second = transfer
            .install_if_necessary_from(&url, &dir, &sink, "Unpacking")
            .await
            .expect("Should check");

        assert!(first);
        assert!(!second);
        assert!(sink.lines().is_empty());
    }

    #[tokio::test]
    async fn changed_source_replaces_directory_contents() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let archive = temp.path().join("go.tar.gz");
        write_go_archive(&archive, "go1.22.5");
        set_mtime(&archive, 1_700_000_000);
        let dir = temp.path().join("go");
        let url = file_url(&archive);
        let transfer = HttpArchiveTransfer::new();

        transfer
            .install_if_necessary_from(&url, &dir, &MemorySink::new(), "Unpacking")
            .await
            .expect("Should install");
        std::fs::write(dir.join("stale.txt"), "old").expect("Should write stale file");

        write_go_archive(&archive, "go1.22.6");
        set_mtime(&archive, 1_700_000_100);
        let installed = transfer
            .install_if_necessary_from(&url, &dir, &MemorySink::new(), "Unpacking")
            .await
            .expect("Should reinstall");

        assert!(installed);
        assert!(!dir.join("stale.txt").exists());
        assert_eq!(
            std::fs::read_to_string(dir.join("go/VERSION")).expect("Should read"),
            "go1.22.6"
        );
    }

    #[tokio::test]
    async fn missing_local_archive_is_an_error() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let url = file_url(&temp.path().join("absent.tar.gz"));
        let result = HttpArchiveTransfer::new()
            .install_if_necessary_from(&url, &temp.path().join("go"), &MemorySink::new(), "m")
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn corrupt_archive_fails_before_writing_timestamp() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let archive = temp.path().join("go.tar.gz");
        std::fs::write(&archive, b"not an archive").expect("Should write");
        let dir = temp.path().join("go");

        let result = HttpArchiveTransfer::new()
            .install_if_necessary_from(&file_url(&archive), &dir, &MemorySink::new(), "m")
            .await;

        assert!(result.is_err());
        assert!(!dir.join(TIMESTAMP_FILE).exists());
    }

    fn http_response(status: &str, headers: &[(&str, &str)], body: &[u8]) -> Vec<u8> {
        let mut head = format!(
            "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n",
            body.len()
        );
        for (name, value) in headers {
            write!(head, "{name}: {value}\r\n").expect("Should format header");
        }
        head.push_str("\r\n");
        let mut bytes = head.into_bytes();
        bytes.extend_from_slice(body);
        bytes
    }

    /// Answers every request on a local port with `response`. Returns the
    /// archive URL and the lowercased request heads received.
    async fn serve(response: Vec<u8>) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("Should bind");
        let addr = listener.local_addr().expect("Should have address");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let mut head = Vec::new();
                let mut chunk = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut chunk).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => head.extend_from_slice(&chunk[..n]),
                    }
                }
                seen.lock()
                    .expect("Should lock")
                    .push(String::from_utf8_lossy(&head).to_lowercase());
                let _ = stream.write_all(&response).await;
                let _ = stream.shutdown().await;
            }
        });

        (format!("http://{addr}/go1.22.5.linux-amd64.tar.gz"), requests)
    }

    fn prepared_dir(temp: &Path) -> PathBuf {
        let dir = temp.join("go");
        std::fs::create_dir_all(&dir).expect("Should create dir");
        std::fs::write(dir.join(TIMESTAMP_FILE), STAMP).expect("Should write timestamp");
        std::fs::write(dir.join("keep.txt"), "installed").expect("Should write file");
        dir
    }

    #[tokio::test]
    async fn http_download_unpacks_and_stores_last_modified() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let archive = temp.path().join("source.tar.gz");
        write_go_archive(&archive, "go1.22.5");
        let body = std::fs::read(&archive).expect("Should read archive");
        let (url, _) = serve(http_response("200 OK", &[("Last-Modified", STAMP)], &body)).await;
        let dir = temp.path().join("go");
        let sink = MemorySink::new();

        let installed = HttpArchiveTransfer::new()
            .install_if_necessary_from(&url, &dir, &sink, "Unpacking")
            .await
            .expect("Should install");

        assert!(installed);
        assert_eq!(sink.lines(), vec!["Unpacking"]);
        assert_eq!(
            std::fs::read_to_string(dir.join("go/VERSION")).expect("Should read"),
            "go1.22.5"
        );
        assert_eq!(
            std::fs::read_to_string(dir.join(TIMESTAMP_FILE)).expect("Should read"),
            STAMP
        );
        assert!(!download_path(&dir).expect("Should compute").exists());
    }

    #[tokio::test]
    async fn not_modified_response_leaves_directory_alone() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let (url, requests) = serve(http_response("304 Not Modified", &[], b"")).await;
        let dir = prepared_dir(temp.path());
        let sink = MemorySink::new();

        let installed = HttpArchiveTransfer::new()
            .install_if_necessary_from(&url, &dir, &sink, "Unpacking")
            .await
            .expect("Should check");

        assert!(!installed);
        assert!(sink.lines().is_empty());
        assert!(dir.join("keep.txt").is_file());
        let requests = requests.lock().expect("Should lock");
        assert!(requests[0].contains(&format!("if-modified-since: {}", STAMP.to_lowercase())));
    }

    #[tokio::test]
    async fn matching_last_modified_skips_download() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let (url, _) = serve(http_response(
            "200 OK",
            &[("Last-Modified", STAMP)],
            b"not read",
        ))
        .await;
        let dir = prepared_dir(temp.path());
        let sink = MemorySink::new();

        let installed = HttpArchiveTransfer::new()
            .install_if_necessary_from(&url, &dir, &sink, "Unpacking")
            .await
            .expect("Should check");

        assert!(!installed);
        assert!(sink.lines().is_empty());
        assert!(dir.join("keep.txt").is_file());
    }

    #[tokio::test]
    async fn http_error_status_fails_without_touching_directory() {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let (url, _) = serve(http_response("404 Not Found", &[], b"missing")).await;
        let dir = prepared_dir(temp.path());
        let sink = MemorySink::new();

        let err = HttpArchiveTransfer::new()
            .install_if_necessary_from(&url, &dir, &sink, "Unpacking")
            .await
            .unwrap_err();

        assert!(err.to_string().starts_with("HTTP error 404"));
        assert!(sink.lines().is_empty());
        assert!(dir.join("keep.txt").is_file());
    }

    #[test]
    fn download_path_is_a_hidden_sibling() {
        let path = download_path(Path::new("/opt/tools/go/default")).expect("Should compute");
        assert_eq!(path, PathBuf::from("/opt/tools/go/.default.download"));
    }
}

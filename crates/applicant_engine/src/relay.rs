use std::path::PathBuf;
use std::sync::{mpsc, Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use crawl_logging::{crawl_debug, crawl_info, crawl_warn};
use futures_util::StreamExt;
use reqwest::header::COOKIE;
use tokio::task::JoinSet;
use url::Url;

use crate::crawl::DownloadSink;
use crate::filename::sanitize_filename;
use crate::persist::{AtomicFileWriter, SavedFile};
use crate::{DownloadError, DownloadRequest, FailureKind, RelayEvent};

#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub output_dir: PathBuf,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("candidates"),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            redirect_limit: 10,
            max_bytes: 50 * 1024 * 1024,
        }
    }
}

#[async_trait::async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, url: &str, cookie_header: Option<&str>)
        -> Result<Vec<u8>, DownloadError>;
}

#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: reqwest::Client,
    max_bytes: u64,
}

impl HttpDownloader {
    pub fn new(settings: &RelaySettings) -> Result<Self, DownloadError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
            .build()
            .map_err(|err| DownloadError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            client,
            max_bytes: settings.max_bytes,
        })
    }

    async fn fetch_http(
        &self,
        url: Url,
        cookie_header: Option<&str>,
    ) -> Result<Vec<u8>, DownloadError> {
        let mut request = self.client.get(url);
        if let Some(cookies) = cookie_header {
            request = request.header(COOKIE, cookies);
        }
        let response = request.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.max_bytes {
                return Err(self.too_large(Some(content_len)));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.max_bytes {
                return Err(self.too_large(Some(next_len)));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }

    fn too_large(&self, actual: Option<u64>) -> DownloadError {
        DownloadError::new(
            FailureKind::TooLarge {
                max_bytes: self.max_bytes,
                actual,
            },
            "response too large",
        )
    }
}

#[async_trait::async_trait]
impl Downloader for HttpDownloader {
    async fn download(
        &self,
        url: &str,
        cookie_header: Option<&str>,
    ) -> Result<Vec<u8>, DownloadError> {
        let parsed = Url::parse(url)
            .map_err(|err| DownloadError::new(FailureKind::InvalidUrl, err.to_string()))?;
        match parsed.scheme() {
            "http" | "https" => self.fetch_http(parsed, cookie_header).await,
            "data" => {
                let bytes = decode_data_url(url)?;
                if bytes.len() as u64 > self.max_bytes {
                    return Err(self.too_large(Some(bytes.len() as u64)));
                }
                Ok(bytes)
            }
            other => Err(DownloadError::new(
                FailureKind::UnsupportedScheme(other.to_string()),
                "only http(s) and base64 data urls can be downloaded",
            )),
        }
    }
}

/// Decodes a base64 `data:` URL into its payload bytes.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, DownloadError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| DownloadError::new(FailureKind::InvalidUrl, "not a data url"))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| DownloadError::new(FailureKind::InvalidUrl, "data url has no payload"))?;
    if !meta.split(';').any(|part| part.eq_ignore_ascii_case("base64")) {
        return Err(DownloadError::new(
            FailureKind::InvalidUrl,
            "data url payload must be base64",
        ));
    }
    STANDARD
        .decode(payload.trim())
        .map_err(|err| DownloadError::new(FailureKind::InvalidUrl, err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> DownloadError {
    if err.is_timeout() {
        return DownloadError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return DownloadError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    DownloadError::new(FailureKind::Network, err.to_string())
}

enum RelayCommand {
    Download(DownloadRequest),
    SetCookieHeader(Option<String>),
}

/// Background download worker.
///
/// Requests are dispatched as soon as they arrive, each on its own task; the
/// sender gets no acknowledgement. Outcomes go to the log and to the event queue.
pub struct DownloadRelay {
    cmd_tx: Mutex<Option<mpsc::Sender<RelayCommand>>>,
    event_rx: Mutex<mpsc::Receiver<RelayEvent>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl DownloadRelay {
    pub fn spawn(settings: RelaySettings) -> Result<Self, DownloadError> {
        let downloader = Arc::new(HttpDownloader::new(&settings)?);
        Self::spawn_with(settings, downloader)
    }

    pub fn spawn_with(
        settings: RelaySettings,
        downloader: Arc<dyn Downloader>,
    ) -> Result<Self, DownloadError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("download-relay-io")
            .enable_all()
            .build()
            .map_err(|err| DownloadError::new(FailureKind::Network, err.to_string()))?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let writer = AtomicFileWriter::new(settings.output_dir);

        let worker = thread::Builder::new()
            .name("download-relay".to_string())
            .spawn(move || {
                let mut tasks = JoinSet::new();
                let mut cookie_header: Option<Arc<str>> = None;
                while let Ok(command) = cmd_rx.recv() {
                    match command {
                        RelayCommand::SetCookieHeader(header) => {
                            cookie_header = header.map(Arc::from);
                        }
                        RelayCommand::Download(request) => {
                            if !request.is_actionable() {
                                crawl_debug!("Ignoring download request without url or filename");
                                let _ = event_tx.send(RelayEvent::Ignored);
                                continue;
                            }
                            let downloader = downloader.clone();
                            let writer = writer.clone();
                            let cookies = cookie_header.clone();
                            let event_tx = event_tx.clone();
                            tasks.spawn_on(
                                async move {
                                    let event =
                                        deliver(downloader.as_ref(), &writer, request, cookies)
                                            .await;
                                    let _ = event_tx.send(event);
                                },
                                runtime.handle(),
                            );
                        }
                    }
                    while tasks.try_join_next().is_some() {}
                }
                // Channel closed: let in-flight downloads finish before the runtime goes away.
                runtime.block_on(async { while tasks.join_next().await.is_some() {} });
            })
            .map_err(|err| DownloadError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            cmd_tx: Mutex::new(Some(cmd_tx)),
            event_rx: Mutex::new(event_rx),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Cookie header attached to subsequent http(s) downloads.
    pub fn set_cookie_header(&self, header: Option<String>) {
        self.command(RelayCommand::SetCookieHeader(header));
    }

    pub fn try_recv(&self) -> Option<RelayEvent> {
        self.event_rx.lock().ok()?.try_recv().ok()
    }

    /// Stops accepting requests and blocks until every accepted download has finished.
    pub fn shutdown(&self) {
        if let Ok(mut tx) = self.cmd_tx.lock() {
            tx.take();
        }
        let worker = self.worker.lock().ok().and_then(|mut w| w.take());
        if let Some(worker) = worker {
            if worker.join().is_err() {
                crawl_warn!("Download relay worker panicked");
            }
        }
    }

    fn command(&self, command: RelayCommand) {
        if let Ok(guard) = self.cmd_tx.lock() {
            if let Some(tx) = guard.as_ref() {
                let _ = tx.send(command);
            }
        }
    }
}

impl DownloadSink for DownloadRelay {
    fn send(&self, request: DownloadRequest) {
        self.command(RelayCommand::Download(request));
    }
}

impl Drop for DownloadRelay {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn deliver(
    downloader: &dyn Downloader,
    writer: &AtomicFileWriter,
    request: DownloadRequest,
    cookie_header: Option<Arc<str>>,
) -> RelayEvent {
    let filename = sanitize_filename(&request.filename);
    let result = match downloader
        .download(&request.download_url, cookie_header.as_deref())
        .await
    {
        Ok(bytes) => writer
            .write(&filename, &bytes)
            .map_err(|err| DownloadError::new(FailureKind::Write, err.to_string())),
        Err(err) => Err(err),
    };

    match result {
        Ok(SavedFile { path, bytes }) => {
            crawl_info!("Downloaded {} ({} bytes) to {:?}", filename, bytes, path);
            RelayEvent::Saved {
                filename,
                path,
                bytes,
            }
        }
        Err(error) => {
            crawl_warn!("Download of {} failed: {}", filename, error);
            RelayEvent::Failed { filename, error }
        }
    }
}

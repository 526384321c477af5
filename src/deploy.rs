//! 站点上传：扫描根目录后按批次推送到托管 API。

use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use std::fmt;
use std::io;
use std::slice::Chunks;
use tracing::{error, info, warn};

use crate::config::{BATCH_SIZE, DeployArgs, IGNORE_LIST};
use crate::prompt::read_api_key;
use crate::scan::{FileEntry, scan_files};

#[derive(Debug, PartialEq, Eq)]
pub enum BatchOutcome {
    Uploaded,
    Rejected { status: u16, body: String },
    Failed(String),
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct DeployReport {
    pub discovered: usize,
    pub batches: usize,
    pub uploaded_files: usize,
    pub failed_batches: usize,
}

#[derive(Debug)]
pub enum DeployError {
    Client(reqwest::Error),
    Io(io::Error),
}

impl fmt::Display for DeployError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployError::Client(err) => write!(f, "http client error: {err}"),
            DeployError::Io(err) => write!(f, "{err}"),
        }
    }
}

impl From<reqwest::Error> for DeployError {
    fn from(err: reqwest::Error) -> Self {
        DeployError::Client(err)
    }
}

impl From<io::Error> for DeployError {
    fn from(err: io::Error) -> Self {
        DeployError::Io(err)
    }
}

/// 按发现顺序切分，每批最多 `BATCH_SIZE` 个文件。
pub fn batches(files: &[FileEntry]) -> Chunks<'_, FileEntry> {
    files.chunks(BATCH_SIZE)
}

pub struct Uploader {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl Uploader {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, DeployError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
        })
    }

    /// 为整批文件发送一次 multipart 请求，不重试。
    pub async fn upload_batch(&self, batch: &[FileEntry]) -> BatchOutcome {
        let form = match build_form(batch).await {
            Ok(form) => form,
            Err(err) => return BatchOutcome::Failed(err.to_string()),
        };

        let response = match self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => return BatchOutcome::Failed(err.to_string()),
        };

        let status = response.status();
        if status == StatusCode::OK {
            return BatchOutcome::Uploaded;
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|err| format!("unreadable response body: {err}"));
        BatchOutcome::Rejected {
            status: status.as_u16(),
            body,
        }
    }
}

/// 读取整批文件并组装表单；字段名为相对路径，不做百分号编码。
async fn build_form(batch: &[FileEntry]) -> Result<Form, DeployError> {
    let mut form = Form::new().percent_encode_noop();
    for file in batch {
        info!(file = %file.relative_path, "queue file");
        let data = tokio::fs::read(&file.absolute_path).await?;
        let file_name = file
            .absolute_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.relative_path.clone());
        let mime = mime_guess::from_path(&file.absolute_path).first_or_octet_stream();
        let part = Part::bytes(data)
            .file_name(file_name)
            .mime_str(mime.essence_str())?;
        form = form.part(file.relative_path.clone(), part);
    }
    Ok(form)
}

/// 逐批顺序上传；失败批次记录日志后跳过。
pub async fn deploy(uploader: &Uploader, files: &[FileEntry]) -> DeployReport {
    let mut report = DeployReport {
        discovered: files.len(),
        ..DeployReport::default()
    };

    info!(files = files.len(), "🚀 starting upload");
    for (index, batch) in batches(files).enumerate() {
        let batch_number = index + 1;
        report.batches += 1;
        match uploader.upload_batch(batch).await {
            BatchOutcome::Uploaded => {
                info!(batch = batch_number, files = batch.len(), "batch uploaded");
                report.uploaded_files += batch.len();
            }
            BatchOutcome::Rejected { status, body } => {
                error!(batch = batch_number, status, body, "batch rejected");
                report.failed_batches += 1;
            }
            BatchOutcome::Failed(message) => {
                error!(batch = batch_number, error = message, "batch failed");
                report.failed_batches += 1;
            }
        }
    }

    info!(
        uploaded = report.uploaded_files,
        failed_batches = report.failed_batches,
        "upload finished"
    );
    report
}

/// `sitekit deploy` 入口。
pub async fn run(args: DeployArgs) -> Result<(), DeployError> {
    let root = std::path::absolute(&args.root)?;

    let api_key = match args.api_key {
        Some(key) => key.trim().to_string(),
        None => tokio::task::spawn_blocking(|| read_api_key(io::stdin().lock(), io::stdout()))
            .await
            .map_err(|err| io::Error::other(err.to_string()))??,
    };
    if api_key.is_empty() {
        warn!("no API key given, nothing uploaded");
        return Ok(());
    }

    info!(root = %root.display(), "scanning site root");
    let scan_root = root.clone();
    let files = tokio::task::spawn_blocking(move || scan_files(&scan_root, IGNORE_LIST))
        .await
        .map_err(|err| io::Error::other(err.to_string()))?;
    info!(count = files.len(), "files discovered");

    let uploader = match Uploader::new(args.api_url, api_key) {
        Ok(uploader) => uploader,
        Err(err) => {
            error!(error = %err, "HTTP client unavailable, upload aborted");
            return Ok(());
        }
    };
    deploy(&uploader, &files).await;
    Ok(())
}

//! Remote filesystem client.
//!
//! Every operation is one round trip against `<base_url>/<route>`. A 2xx
//! status means success; anything else becomes [`VfsError::Status`] carrying
//! the operation's label and the response status text. There is no retry and
//! no caching, and concurrent calls are not ordered relative to each other.

use std::fmt;
use std::sync::Arc;

use base64::Engine as _;
use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use kde_platform::transport::{
    FormPart, HttpRequest, HttpResponse, Method, RequestBody, Transport,
};

use crate::error::VfsError;
use crate::http::ReqwestTransport;
use crate::protocol::{FileInfo, PathBody, SearchBody, SearchOptions, TransferBody, WriteFileBody};

pub type Result<T> = std::result::Result<T, VfsError>;

/// Everything `encodeURIComponent` escapes: all but `A-Z a-z 0-9 - _ . ! ~ * ' ( )`
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// File name sent for an upload whose path has no final segment
const FALLBACK_UPLOAD_NAME: &str = "blob";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ReadDirectory,
    ReadFile,
    WriteFile,
    DeleteFile,
    CopyFile,
    MoveFile,
    CreateDirectory,
    GetFileInfo,
    SearchFiles,
    UploadFile,
    DownloadFile,
}

impl Operation {
    pub const ALL: [Operation; 11] = [
        Operation::ReadDirectory,
        Operation::ReadFile,
        Operation::WriteFile,
        Operation::DeleteFile,
        Operation::CopyFile,
        Operation::MoveFile,
        Operation::CreateDirectory,
        Operation::GetFileInfo,
        Operation::SearchFiles,
        Operation::UploadFile,
        Operation::DownloadFile,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operation::ReadDirectory => "read_directory",
            Operation::ReadFile => "read_file",
            Operation::WriteFile => "write_file",
            Operation::DeleteFile => "delete_file",
            Operation::CopyFile => "copy_file",
            Operation::MoveFile => "move_file",
            Operation::CreateDirectory => "create_directory",
            Operation::GetFileInfo => "get_file_info",
            Operation::SearchFiles => "search_files",
            Operation::UploadFile => "upload_file",
            Operation::DownloadFile => "download_file",
        }
    }

    pub fn route(&self) -> &'static str {
        match self {
            Operation::ReadDirectory => "read-directory",
            Operation::ReadFile => "read-file",
            Operation::WriteFile => "write-file",
            Operation::DeleteFile => "delete-file",
            Operation::CopyFile => "copy",
            Operation::MoveFile => "move",
            Operation::CreateDirectory => "create-directory",
            Operation::GetFileInfo => "file-info",
            Operation::SearchFiles => "search",
            Operation::UploadFile => "upload",
            Operation::DownloadFile => "download-url",
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Operation::ReadDirectory
            | Operation::ReadFile
            | Operation::GetFileInfo
            | Operation::DownloadFile => Method::Get,
            Operation::DeleteFile => Method::Delete,
            Operation::WriteFile
            | Operation::CopyFile
            | Operation::MoveFile
            | Operation::CreateDirectory
            | Operation::SearchFiles
            | Operation::UploadFile => Method::Post,
        }
    }

    /// Fixed prefix of every failure message for this operation
    pub fn label(&self) -> &'static str {
        match self {
            Operation::ReadDirectory => "Failed to read directory",
            Operation::ReadFile => "Failed to read file",
            Operation::WriteFile => "Failed to write file",
            Operation::DeleteFile => "Failed to delete file",
            Operation::CopyFile => "Failed to copy file",
            Operation::MoveFile => "Failed to move file",
            Operation::CreateDirectory => "Failed to create directory",
            Operation::GetFileInfo => "Failed to get file info",
            Operation::SearchFiles => "Failed to search files",
            Operation::UploadFile => "Failed to upload file",
            Operation::DownloadFile => "Failed to generate download URL",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Handle bound to one backend root
#[derive(Clone)]
pub struct Vfs {
    base_url: String,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for Vfs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vfs").field("base_url", &self.base_url).finish()
    }
}

impl Vfs {
    /// Client over the default reqwest transport. The URL is not validated here.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_transport(base_url, Arc::new(ReqwestTransport::new()))
    }

    pub fn with_transport(base_url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        let base_url = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            base_url,
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn read_directory(&self, path: &str) -> Result<Vec<FileInfo>> {
        let op = Operation::ReadDirectory;
        let resp = self.execute(op, self.path_query_request(op, path)?).await?;
        parse_json(op, &resp)
    }

    pub async fn read_file(&self, path: &str) -> Result<Bytes> {
        let op = Operation::ReadFile;
        let resp = self.execute(op, self.path_query_request(op, path)?).await?;
        Ok(resp.body)
    }

    pub async fn write_file(&self, path: &str, content: &[u8]) -> Result<()> {
        let op = Operation::WriteFile;
        let body = WriteFileBody {
            path,
            content: base64::engine::general_purpose::STANDARD.encode(content),
        };
        let request = self.json_request(op, &body)?;
        self.execute(op, request).await?;
        Ok(())
    }

    pub async fn delete_file(&self, path: &str) -> Result<()> {
        let op = Operation::DeleteFile;
        self.execute(op, self.path_query_request(op, path)?).await?;
        Ok(())
    }

    pub async fn copy_file(&self, source: &str, destination: &str) -> Result<()> {
        let op = Operation::CopyFile;
        let request = self.json_request(op, &TransferBody {
            source,
            destination,
        })?;
        self.execute(op, request).await?;
        Ok(())
    }

    pub async fn move_file(&self, source: &str, destination: &str) -> Result<()> {
        let op = Operation::MoveFile;
        let request = self.json_request(op, &TransferBody {
            source,
            destination,
        })?;
        self.execute(op, request).await?;
        Ok(())
    }

    pub async fn create_directory(&self, path: &str) -> Result<()> {
        let op = Operation::CreateDirectory;
        let request = self.json_request(op, &PathBody { path })?;
        self.execute(op, request).await?;
        Ok(())
    }

    pub async fn get_file_info(&self, path: &str) -> Result<FileInfo> {
        let op = Operation::GetFileInfo;
        let resp = self.execute(op, self.path_query_request(op, path)?).await?;
        parse_json(op, &resp)
    }

    /// Unset fields of `options` are left out of the request body
    pub async fn search_files(
        &self,
        query: &str,
        options: Option<&SearchOptions>,
    ) -> Result<Vec<FileInfo>> {
        let op = Operation::SearchFiles;
        let default_options = SearchOptions::default();
        let body = SearchBody {
            query,
            options: options.unwrap_or(&default_options),
        };
        let request = self.json_request(op, &body)?;
        let resp = self.execute(op, request).await?;
        parse_json(op, &resp)
    }

    pub async fn upload_file(&self, path: &str, file: impl Into<Bytes>) -> Result<()> {
        let op = Operation::UploadFile;
        let file_name = path
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
            .unwrap_or(FALLBACK_UPLOAD_NAME);
        let parts = vec![
            FormPart::Text {
                name: "path".to_string(),
                value: path.to_string(),
            },
            FormPart::File {
                name: "file".to_string(),
                file_name: file_name.to_string(),
                content_type: "application/octet-stream".to_string(),
                data: file.into(),
            },
        ];
        let request = HttpRequest {
            method: op.method(),
            url: self.route_url(op)?.to_string(),
            body: RequestBody::Multipart(parts),
        };
        self.execute(op, request).await?;
        Ok(())
    }

    /// Returns a URL the file can be fetched from, not the file itself
    pub async fn download_file(&self, path: &str) -> Result<String> {
        let op = Operation::DownloadFile;
        let resp = self.execute(op, self.path_query_request(op, path)?).await?;
        Ok(String::from_utf8_lossy(&resp.body).into_owned())
    }

    fn route_url(&self, op: Operation) -> Result<reqwest::Url> {
        let url = format!("{}/{}", self.base_url, op.route());
        reqwest::Url::parse(&url).map_err(|e| VfsError::InvalidUrl {
            operation: op,
            url,
            reason: e.to_string(),
        })
    }

    /// `?path=` is percent-encoded (space as `%20`, never `+`) so that a plain
    /// percent-decode of the query gives back `path`
    fn path_query_request(&self, op: Operation, path: &str) -> Result<HttpRequest> {
        let url = self.route_url(op)?;
        // appended by hand; `Url::set_query` would re-escape `'`
        Ok(HttpRequest {
            method: op.method(),
            url: format!("{}?path={}", url, utf8_percent_encode(path, QUERY_VALUE)),
            body: RequestBody::Empty,
        })
    }

    fn json_request<T: Serialize>(&self, op: Operation, body: &T) -> Result<HttpRequest> {
        let url = self.route_url(op)?;
        let body = serde_json::to_vec(body).map_err(|source| VfsError::Encode {
            operation: op,
            source,
        })?;
        Ok(HttpRequest {
            method: op.method(),
            url: url.to_string(),
            body: RequestBody::Json(Bytes::from(body)),
        })
    }

    async fn execute(&self, op: Operation, request: HttpRequest) -> Result<HttpResponse> {
        debug!("vfs {}: {} {}", op, request.method, request.url);

        let resp = self
            .transport
            .send(request)
            .await
            .map_err(|source| VfsError::Network {
                operation: op,
                source,
            })?;

        if !resp.is_success() {
            warn!("vfs {} failed: {} {}", op, resp.status, resp.status_text);
            return Err(VfsError::Status {
                operation: op,
                status_text: resp.status_text,
            });
        }

        Ok(resp)
    }
}

fn parse_json<T: DeserializeOwned>(op: Operation, resp: &HttpResponse) -> Result<T> {
    serde_json::from_slice(&resp.body).map_err(|source| VfsError::Decode {
        operation: op,
        source,
    })
}

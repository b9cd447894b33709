//! reqwest-backed [`Transport`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;

use kde_platform::transport::{FormPart, HttpRequest, HttpResponse, Method, RequestBody, Transport};

/// Sends requests with a shared [`reqwest::Client`]
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.url);
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body),
            RequestBody::Multipart(parts) => builder.multipart(build_form(parts)?),
        };

        let resp = builder
            .send()
            .await
            .with_context(|| format!("{} {} failed", request.method, request.url))?;

        let status = resp.status();
        let status_text = reason_phrase(&resp);
        let body = resp
            .bytes()
            .await
            .with_context(|| format!("failed to read response body from {}", request.url))?;

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text,
            body,
        })
    }
}

/// The phrase the server actually sent on the status line. hyper only records
/// it when it differs from the canonical one; HTTP/2 carries none at all.
fn reason_phrase(resp: &reqwest::Response) -> String {
    match resp.extensions().get::<hyper::ext::ReasonPhrase>() {
        Some(phrase) => String::from_utf8_lossy(phrase.as_bytes()).into_owned(),
        None => resp
            .status()
            .canonical_reason()
            .unwrap_or_default()
            .to_string(),
    }
}

fn build_form(parts: Vec<FormPart>) -> Result<Form> {
    let mut form = Form::new();
    for part in parts {
        form = match part {
            FormPart::Text { name, value } => form.text(name, value),
            FormPart::File {
                name,
                file_name,
                content_type,
                data,
            } => {
                let part = Part::bytes(data.to_vec())
                    .file_name(file_name)
                    .mime_str(&content_type)
                    .with_context(|| format!("invalid content type {}", content_type))?;
                form.part(name, part)
            }
        };
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_transport_creation() {
        let _transport = ReqwestTransport::new();
        let _default = ReqwestTransport::default();
        let _custom = ReqwestTransport::with_client(Client::new());
    }

    #[test]
    fn test_build_form() {
        let form = build_form(vec![
            FormPart::Text {
                name: "path".to_string(),
                value: "/a.txt".to_string(),
            },
            FormPart::File {
                name: "file".to_string(),
                file_name: "a.txt".to_string(),
                content_type: "application/octet-stream".to_string(),
                data: Bytes::from_static(b"abc"),
            },
        ]);
        assert!(form.is_ok());
    }

    #[test]
    fn test_build_form_rejects_bad_content_type() {
        let form = build_form(vec![FormPart::File {
            name: "file".to_string(),
            file_name: "a".to_string(),
            content_type: "not a mime type".to_string(),
            data: Bytes::new(),
        }]);
        assert!(form.is_err());
    }

    /// One-shot HTTP/1.1 server that answers every connection with `response`
    async fn serve_once(response: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn get(url: String) -> HttpRequest {
        HttpRequest {
            method: Method::Get,
            url,
            body: RequestBody::Empty,
        }
    }

    #[tokio::test]
    async fn test_status_text_is_the_servers_phrase() {
        let base = serve_once(
            "HTTP/1.1 404 File Missing\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;
        let resp = ReqwestTransport::new()
            .send(get(format!("{}/delete-file?path=%2Fa", base)))
            .await
            .unwrap();
        assert_eq!(resp.status, 404);
        assert_eq!(resp.status_text, "File Missing");
        assert!(!resp.is_success());
    }

    #[tokio::test]
    async fn test_status_text_canonical_phrase() {
        let base = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\n[]",
        )
        .await;
        let resp = ReqwestTransport::new()
            .send(get(format!("{}/read-directory?path=%2F", base)))
            .await
            .unwrap();
        assert_eq!(resp.status_text, "OK");
        assert_eq!(&resp.body[..], b"[]");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_an_error() {
        let transport = ReqwestTransport::new();
        let result = transport
            .send(HttpRequest {
                method: Method::Get,
                url: "http://127.0.0.1:1/read-file?path=%2F".to_string(),
                body: RequestBody::Empty,
            })
            .await;
        assert!(result.is_err());
    }
}

use crate::domain::ports::PdfRenderer;
use crate::utils::error::{ExportError, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

pub const DEFAULT_PDF_PROGRAM: &str = "wkhtmltopdf";

pub fn default_pdf_args() -> Vec<String> {
    vec!["--quiet".to_string(), "-".to_string(), "-".to_string()]
}

/// Pipes the HTML through an external converter (stdin → stdout).
#[derive(Debug, Clone)]
pub struct CommandPdfRenderer {
    program: String,
    args: Vec<String>,
}

impl CommandPdfRenderer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl Default for CommandPdfRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_PDF_PROGRAM, default_pdf_args())
    }
}

#[async_trait]
impl PdfRenderer for CommandPdfRenderer {
    async fn render(&self, html: &str) -> Result<Vec<u8>> {
        tracing::debug!("Rendering PDF with {} {:?}", self.program, self.args);
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExportError::PdfRenderError {
                message: format!("failed to start {}: {}", self.program, e),
            })?;

        let mut stdin = child.stdin.take().ok_or_else(|| ExportError::PdfRenderError {
            message: "renderer stdin unavailable".to_string(),
        })?;
        // 邊寫邊讀，避免管線緩衝區塞滿
        let input = html.to_owned();
        let writer = tokio::spawn(async move {
            stdin.write_all(input.as_bytes()).await?;
            stdin.shutdown().await
        });

        let output = child.wait_with_output().await?;
        match writer.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!("Renderer closed stdin early: {}", e),
            Err(e) => {
                return Err(ExportError::PdfRenderError {
                    message: format!("stdin writer failed: {}", e),
                })
            }
        }

        if !output.status.success() {
            return Err(ExportError::PdfRenderError {
                message: format!(
                    "{} exited with {}: {}",
                    self.program,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        if output.stdout.is_empty() {
            return Err(ExportError::PdfRenderError {
                message: format!("{} produced no output", self.program),
            });
        }
        Ok(output.stdout)
    }
}

/// Posts the HTML to a rendering service that answers with the PDF bytes.
#[derive(Debug, Clone)]
pub struct HttpPdfRenderer {
    endpoint: String,
    client: Client,
}

impl HttpPdfRenderer {
    pub fn new(endpoint: impl Into<String>, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }
}

#[async_trait]
impl PdfRenderer for HttpPdfRenderer {
    async fn render(&self, html: &str) -> Result<Vec<u8>> {
        tracing::debug!("Posting {} bytes of HTML to {}", html.len(), self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "text/html; charset=utf-8")
            .body(html.to_owned())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ExportError::PdfRenderError {
                message: format!("rendering service answered {}", response.status()),
            });
        }
        let data = response.bytes().await?;
        if data.is_empty() {
            return Err(ExportError::PdfRenderError {
                message: "rendering service returned an empty body".to_string(),
            });
        }
        Ok(data.to_vec())
    }
}

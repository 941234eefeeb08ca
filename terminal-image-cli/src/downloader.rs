// ABOUTME: Fetches remote image sources over HTTP(S) for rendering
// ABOUTME: Enforces size limits while streaming and rejects responses that are not images

use crate::url_validator::ImageUrlValidator;
use anyhow::{Context, Result, bail};
use futures_util::StreamExt;
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use std::io::IsTerminal;
use std::time::Duration;
use url::Url;

const USER_AGENT: &str = concat!("terminal-image/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_REDIRECTS: usize = 3;

/// Smallest payload that can carry a recognisable image signature
const MIN_IMAGE_BYTES: usize = 8;

pub struct ImageDownloader {
    client: Client,
    validator: ImageUrlValidator,
    max_size: u64,
    show_progress: bool,
}

impl ImageDownloader {
    pub fn new(max_size: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            validator: ImageUrlValidator::new(),
            max_size,
            // stderr, so the bar never lands in rendered output
            show_progress: std::io::stderr().is_terminal(),
        })
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Download an image, returning its raw encoded bytes
    pub async fn download_image(&self, source: &str) -> Result<Vec<u8>> {
        let url = self.validator.validate_image_url(source)?;
        log::debug!("Fetching {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("Server answered {} for {}", status, url);
        }

        self.check_headers(&response, &url)?;
        let bytes = self.read_body(response, &url).await?;
        check_signature(&bytes, &url)?;

        Ok(bytes)
    }

    fn check_headers(&self, response: &Response, url: &Url) -> Result<()> {
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok());

        match content_type {
            Some(mime) if mime.starts_with("image/") => {}
            // Generic or missing types fall through to the signature check
            None | Some("application/octet-stream") => {
                log::debug!("{} sent no image content-type", url);
            }
            Some(mime) => bail!("{} is not an image (content-type: {})", url, mime),
        }

        match response.content_length() {
            Some(length) if length > self.max_size => bail!(
                "Image at {} is too large: {} exceeds the {} limit",
                url,
                HumanBytes(length),
                HumanBytes(self.max_size)
            ),
            _ => Ok(()),
        }
    }

    async fn read_body(&self, response: Response, url: &Url) -> Result<Vec<u8>> {
        let expected = response.content_length();
        let progress = if self.show_progress {
            Some(download_progress(expected, display_name(url))?)
        } else {
            None
        };

        let mut body = Vec::with_capacity(expected.unwrap_or(0).min(self.max_size) as usize);
        let mut chunks = response.bytes_stream();

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.with_context(|| format!("Connection to {} broke off", url))?;
            body.extend_from_slice(&chunk);
            let received = body.len() as u64;

            if received > self.max_size {
                if let Some(bar) = &progress {
                    bar.abandon_with_message("size limit exceeded");
                }
                bail!(
                    "Image at {} is too large: more than {} received",
                    url,
                    HumanBytes(self.max_size)
                );
            }
            if let Some(bar) = &progress {
                bar.set_position(received);
            }
        }

        if let Some(bar) = progress {
            bar.finish_and_clear();
        }
        log::debug!("Received {} from {}", HumanBytes(body.len() as u64), url);

        Ok(body)
    }
}

fn check_signature(bytes: &[u8], url: &Url) -> Result<()> {
    if bytes.len() < MIN_IMAGE_BYTES {
        bail!("{} returned only {} bytes, not an image", url, bytes.len());
    }

    match image::guess_format(bytes) {
        Ok(format) => {
            log::debug!("{} looks like {:?}", url, format);
            Ok(())
        }
        Err(_) => bail!("{} did not return a recognisable image", url),
    }
}

/// Last path segment, used to label the progress bar
fn display_name(url: &Url) -> &str {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .unwrap_or("image")
}

fn download_progress(total: Option<u64>, name: &str) -> Result<ProgressBar> {
    let bar = match total {
        Some(total) => ProgressBar::new(total).with_style(
            ProgressStyle::with_template("{msg} [{bar:25.cyan/blue}] {bytes}/{total_bytes}")?
                .progress_chars("=>-"),
        ),
        None => ProgressBar::new_spinner()
            .with_style(ProgressStyle::with_template("{spinner:.green} {msg} {bytes}")?),
    };
    bar.set_message(name.to_string());
    Ok(bar)
}

// ABOUTME: Loads image bytes from a local path or a remote URL given on the command line
// ABOUTME: Delegates remote sources to the downloader and reads local files with tokio

use crate::downloader::ImageDownloader;
use crate::url_validator::ImageUrlValidator;
use anyhow::{Context, Result};

pub async fn load_source(source: &str, max_download_size: u64) -> Result<Vec<u8>> {
    if ImageUrlValidator::new().is_remote(source) {
        let downloader = ImageDownloader::new(max_download_size)?;
        return downloader
            .download_image(source)
            .await
            .with_context(|| format!("Failed to download {}", source));
    }

    tokio::fs::read(source)
        .await
        .with_context(|| format!("Failed to read image file: {}", source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_local_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("image.bin");
        std::fs::write(&path, b"bytes on disk").unwrap();

        let bytes = load_source(path.to_str().unwrap(), 1024).await.unwrap();
        assert_eq!(bytes, b"bytes on disk");
    }

    #[tokio::test]
    async fn test_missing_file_has_context() {
        let err = load_source("/definitely/missing/image.png", 1024)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read image file"));
    }

    #[tokio::test]
    async fn test_load_remote_source() {
        let mut server = Server::new_async().await;
        let gif = b"GIF89a\x01\x00\x01\x00\x00\x00\x00;";
        let mock = server
            .mock("GET", "/anim.gif")
            .with_status(200)
            .with_header("content-type", "image/gif")
            .with_body(gif)
            .create_async()
            .await;

        let url = format!("{}/anim.gif", server.url());
        let bytes = load_source(&url, 1024).await.unwrap();

        mock.assert_async().await;
        assert_eq!(bytes, gif);
    }
}

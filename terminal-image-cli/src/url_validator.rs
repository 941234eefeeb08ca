// ABOUTME: URL validation for remote image sources and human-readable size parsing
// ABOUTME: Restricts schemes and suspicious paths before anything is downloaded

use anyhow::{Result, anyhow};
use url::Url;

#[derive(Debug, Clone, Default)]
pub struct ImageUrlValidator;

impl ImageUrlValidator {
    pub fn new() -> Self {
        Self
    }

    /// Whether a command-line source should be fetched rather than read from disk
    pub fn is_remote(&self, source: &str) -> bool {
        let lower = source.to_ascii_lowercase();
        lower.starts_with("http://") || lower.starts_with("https://")
    }

    pub fn validate_image_url(&self, url: &str) -> Result<Url> {
        let parsed_url = Url::parse(url).map_err(|e| anyhow!("Invalid URL '{}': {}", url, e))?;

        self.check_scheme(&parsed_url)?;
        self.check_path(&parsed_url)?;

        if !self.has_image_extension(&parsed_url) {
            log::debug!(
                "URL has no image extension, relying on content checks: {}",
                parsed_url
            );
        }

        Ok(parsed_url)
    }

    pub fn has_image_extension(&self, url: &Url) -> bool {
        let image_extensions = [
            ".png", ".apng", ".jpg", ".jpeg", ".gif", ".webp", ".bmp", ".tiff", ".tif",
        ];

        let path = url.path().to_lowercase();
        image_extensions.iter().any(|ext| path.ends_with(ext))
    }

    fn check_scheme(&self, url: &Url) -> Result<()> {
        match url.scheme() {
            "https" => Ok(()),
            "http" => {
                let local = url.host_str().is_some_and(|host| {
                    host == "localhost" || host.starts_with("127.") || host.starts_with("192.168.")
                });
                if !local {
                    log::warn!("Fetching image over unencrypted HTTP: {}", url);
                }
                Ok(())
            }
            scheme => Err(anyhow!("Unsupported URL scheme '{}': {}", scheme, url)),
        }
    }

    fn check_path(&self, url: &Url) -> Result<()> {
        if url.host_str().is_none() {
            return Err(anyhow!("URL missing host: {}", url));
        }

        let path = url.path();

        // Prevent directory traversal
        if path.contains("..") {
            return Err(anyhow!("Path traversal detected: {}", url));
        }

        // Prevent suspicious paths
        let suspicious_patterns = ["/etc/", "/var/", "/proc/", "/sys/"];
        for pattern in &suspicious_patterns {
            if path.contains(pattern) {
                return Err(anyhow!("Suspicious path detected: {}", url));
            }
        }

        Ok(())
    }
}

/// Parse sizes like "512", "64KB", "10MB" or "1GB" into bytes
pub fn parse_size(size: &str) -> std::result::Result<u64, String> {
    let size_str = size.trim().to_uppercase();

    let (number_part, unit) = if let Some(n) = size_str.strip_suffix("GB") {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = size_str.strip_suffix("MB") {
        (n, 1024 * 1024)
    } else if let Some(n) = size_str.strip_suffix("KB") {
        (n, 1024)
    } else if let Some(n) = size_str.strip_suffix('B') {
        (n, 1)
    } else {
        (size_str.as_str(), 1)
    };

    let number = number_part
        .trim()
        .parse::<u64>()
        .map_err(|_| format!("'{}' is not a whole number", number_part.trim()))?;
    number
        .checked_mul(unit)
        .ok_or_else(|| "size is too large".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_extension_detection() {
        let validator = ImageUrlValidator::new();
        let url = |s: &str| Url::parse(s).unwrap();

        assert!(validator.has_image_extension(&url("https://example.com/image.png")));
        assert!(validator.has_image_extension(&url("https://example.com/image.JPG")));
        assert!(validator.has_image_extension(&url("https://example.com/path/cat.gif?size=1")));
        assert!(!validator.has_image_extension(&url("https://example.com/document.pdf")));
        assert!(!validator.has_image_extension(&url("https://example.com/no-extension")));
    }

    #[test]
    fn test_remote_detection() {
        let validator = ImageUrlValidator::new();

        assert!(validator.is_remote("https://example.com/a.png"));
        assert!(validator.is_remote("HTTP://example.com/a.png"));
        assert!(!validator.is_remote("./images/a.png"));
        assert!(!validator.is_remote("/tmp/http.png"));
    }

    #[test]
    fn test_url_validation_security() {
        let validator = ImageUrlValidator::new();

        assert!(validator.validate_image_url("https://example.com/image.png").is_ok());
        assert!(validator.validate_image_url("http://localhost:8080/image").is_ok());
        assert!(validator.validate_image_url("http://example.com/image.gif").is_ok());

        // Invalid schemes should fail
        assert!(validator.validate_image_url("ftp://example.com/image.png").is_err());
        assert!(validator.validate_image_url("file:///etc/passwd").is_err());

        // Directory traversal should fail
        assert!(
            validator
                .validate_image_url("https://example.com/a/%2E%2E/etc/passwd")
                .is_err()
        );
        assert!(validator.validate_image_url("not-a-url").is_err());
    }

    #[test]
    fn test_size_parsing() {
        assert_eq!(parse_size("1000"), Ok(1000));
        assert_eq!(parse_size("5MB"), Ok(5 * 1024 * 1024));
        assert_eq!(parse_size("2gb"), Ok(2 * 1024 * 1024 * 1024));
        assert_eq!(parse_size("500KB"), Ok(500 * 1024));
        assert_eq!(parse_size("64 B"), Ok(64));
        assert!(parse_size("invalid").is_err());
        assert!(parse_size("1.5MB").is_err());
        assert!(parse_size("").is_err());
    }
}

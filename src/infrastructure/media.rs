use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;
use uuid::Uuid;

const POSTS_DIR: &str = "posts";

/// Image formats accepted for post pictures, detected by magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Gif,
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(ImageFormat::Gif)
        } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(ImageFormat::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageFormat::Jpeg)
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(ImageFormat::Webp)
        } else {
            None
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Gif => "gif",
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Webp => "webp",
        }
    }
}

#[derive(Clone, Debug)]
pub struct MediaStorage {
    pub root: PathBuf,
    pub base_url: String,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    /// Keeps only the stem of the final path component, reduced to URL-safe
    /// characters. The extension always follows the detected format, never
    /// the client's name.
    fn sanitize_filename(name: &str, format: ImageFormat) -> String {
        let stem = Path::new(name)
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let cleaned: String = stem
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        let cleaned = cleaned.trim_matches('_');
        let stem = if cleaned.is_empty() { "image" } else { cleaned };
        format!("{}.{}", stem, format.extension())
    }

    /// Stores a post image under `posts/`, returning its media-relative path.
    /// Taken names get a short random suffix before the extension.
    pub async fn save_post_image(
        &self,
        original_name: &str,
        bytes: &[u8],
        format: ImageFormat,
    ) -> Result<String, std::io::Error> {
        let dir = self.root.join(POSTS_DIR);
        fs::create_dir_all(&dir).await?;

        let mut filename = Self::sanitize_filename(original_name, format);
        if fs::try_exists(dir.join(&filename)).await? {
            let stem = Path::new(&filename)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("image")
                .to_string();
            let suffix = Uuid::new_v4().simple().to_string();
            filename = format!("{}_{}.{}", stem, &suffix[..7], format.extension());
        }

        fs::write(dir.join(&filename), bytes).await?;
        let relative = format!("{}/{}", POSTS_DIR, filename);
        info!("Saved image {}", relative);
        Ok(relative)
    }

    pub fn url_for(&self, relative: &str) -> String {
        format!("{}{}", self.base_url, relative)
    }

    pub async fn delete(&self, relative: &str) -> Result<(), std::io::Error> {
        fs::remove_file(self.root.join(relative)).await
    }
}

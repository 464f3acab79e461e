use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::database::SocialDatabase;
use crate::error::{AppResult, FormErrors};
use crate::infrastructure::media::ImageFormat;

use super::{REQUIRED, INVALID_CHOICE};

/// Uploaded picture carried inline in the JSON body.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageUpload {
    pub name: String,
    pub content_base64: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub group: Option<i64>,
    #[serde(default)]
    pub image: Option<ImageUpload>,
}

#[derive(Debug, Clone)]
pub struct CleanedImage {
    pub name: String,
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

#[derive(Debug, Clone)]
pub struct CleanedPost {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<CleanedImage>,
}

/// Field description handed to clients rendering the create/edit page.
#[derive(Debug, Clone, Serialize)]
pub struct PostFormView {
    pub text: String,
    pub group: Option<i64>,
    pub image: Option<String>,
    pub fields: [&'static str; 3],
}

impl PostFormView {
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            group: None,
            image: None,
            fields: ["text", "group", "image"],
        }
    }

    pub fn initial(text: &str, group: Option<i64>, image: Option<String>) -> Self {
        Self {
            text: text.to_string(),
            group,
            image,
            fields: ["text", "group", "image"],
        }
    }
}

pub fn clean_image(upload: &ImageUpload, max_bytes: usize, errors: &mut FormErrors) -> Option<CleanedImage> {
    let bytes = match base64::engine::general_purpose::STANDARD.decode(upload.content_base64.trim()) {
        Ok(bytes) => bytes,
        Err(_) => {
            errors.add("image", "The submitted data was not a file.");
            return None;
        }
    };
    if bytes.is_empty() {
        errors.add("image", "The submitted file is empty.");
        return None;
    }
    if bytes.len() > max_bytes {
        errors.add("image", format!("The file is larger than {} bytes.", max_bytes));
        return None;
    }
    match ImageFormat::sniff(&bytes) {
        Some(format) => Some(CleanedImage {
            name: upload.name.clone(),
            bytes,
            format,
        }),
        None => {
            errors.add(
                "image",
                "Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
            );
            None
        }
    }
}

impl PostForm {
    /// Text is required; a chosen group must exist at write time.
    pub async fn clean(self, db: &SocialDatabase, max_upload_bytes: usize) -> AppResult<CleanedPost> {
        let mut errors = FormErrors::new();

        if self.text.trim().is_empty() {
            errors.add("text", REQUIRED);
        }

        if let Some(group_id) = self.group {
            if db.get_group(group_id).await?.is_none() {
                errors.add("group", INVALID_CHOICE);
            }
        }

        let image = self
            .image
            .as_ref()
            .and_then(|upload| clean_image(upload, max_upload_bytes, &mut errors));

        errors.into_result(CleanedPost {
            text: self.text,
            group_id: self.group,
            image,
        })
    }
}

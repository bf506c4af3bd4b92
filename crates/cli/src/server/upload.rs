//! Multipart form decoding for page and asset uploads.

use axum::extract::Multipart;
use axum::extract::multipart::Field;
use pagehost_core::UploadedFile;

use super::error::ServerError;

/// Fields of the upload and add-assets forms
#[derive(Debug, Default)]
pub struct UploadForm {
    pub custom_slug: Option<String>,
    pub html_file: Option<Vec<u8>>,
    pub css_files: Vec<UploadedFile>,
    pub img_files: Vec<UploadedFile>,
}

impl UploadForm {
    /// Drain a multipart body. Unknown fields are ignored.
    ///
    /// Browsers send an empty part with an empty file name for a file input
    /// left blank; those parts are dropped rather than treated as files.
    pub async fn read(mut multipart: Multipart) -> Result<Self, ServerError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "custom_slug" => {
                    let text = field.text().await?;
                    if !text.trim().is_empty() {
                        form.custom_slug = Some(text);
                    }
                }
                "html_file" => {
                    if let Some(file) = read_file(field).await? {
                        form.html_file = Some(file.data);
                    }
                }
                "css_files" => {
                    if let Some(file) = read_file(field).await? {
                        form.css_files.push(file);
                    }
                }
                "img_files" => {
                    if let Some(file) = read_file(field).await? {
                        form.img_files.push(file);
                    }
                }
                other => {
                    tracing::debug!(field = %other, "Ignoring unknown upload field");
                }
            }
        }

        Ok(form)
    }
}

async fn read_file(field: Field<'_>) -> Result<Option<UploadedFile>, ServerError> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let data = field.bytes().await?;
    if file_name.is_empty() {
        return Ok(None);
    }
    Ok(Some(UploadedFile::new(file_name, data.to_vec())))
}

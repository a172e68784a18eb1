// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound webhook payload.
//!
//! Wire shape:
//! `{"message": string, "voice": null, "files": [{"filename", "content", "type"}] | null}`
//! where `content` is standard base64.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use parlo_core::ParloError;
use serde::{Deserialize, Serialize};

/// A file staged for upload, with its raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub filename: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl FileUpload {
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Reads a file from disk, guessing its MIME type from the extension.
    pub async fn from_path(path: &Path) -> Result<Self, ParloError> {
        let data = tokio::fs::read(path).await.map_err(|e| ParloError::Storage {
            source: Box::new(e),
        })?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());
        let mime_type = guess_mime_type(&filename);
        Ok(Self {
            filename,
            mime_type,
            data,
        })
    }
}

/// MIME type for `filename`, from its extension.
///
/// Unknown or missing extensions fall back to `application/octet-stream`.
pub fn guess_mime_type(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// One encoded file in the outbound payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePayload {
    pub filename: String,
    /// Base64-encoded file bytes.
    pub content: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

impl From<&FileUpload> for FilePayload {
    fn from(upload: &FileUpload) -> Self {
        Self {
            filename: upload.filename.clone(),
            content: STANDARD.encode(&upload.data),
            mime_type: upload.mime_type.clone(),
        }
    }
}

/// Body posted to the webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundPayload {
    pub message: String,
    /// Always `null` on the wire; kept for the endpoint's schema.
    pub voice: Option<String>,
    /// `null` when nothing is attached.
    pub files: Option<Vec<FilePayload>>,
}

impl OutboundPayload {
    pub fn new(message: impl Into<String>, uploads: &[FileUpload]) -> Self {
        let files = if uploads.is_empty() {
            None
        } else {
            Some(uploads.iter().map(FilePayload::from).collect())
        };
        Self {
            message: message.into(),
            voice: None,
            files,
        }
    }

    pub fn text(message: impl Into<String>) -> Self {
        Self::new(message, &[])
    }

    pub fn to_json(&self) -> Result<serde_json::Value, ParloError> {
        serde_json::to_value(self)
            .map_err(|e| ParloError::Internal(format!("failed to encode payload: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_only_payload_has_null_voice_and_files() {
        let value = OutboundPayload::text("hola").to_json().unwrap();
        assert_eq!(value, json!({"message": "hola", "voice": null, "files": null}));
    }

    #[test]
    fn files_are_base64_encoded_with_type_key() {
        let upload = FileUpload::new("note.txt", "text/plain", b"hi there".to_vec());
        let value = OutboundPayload::new("see file", &[upload]).to_json().unwrap();
        assert_eq!(
            value["files"],
            json!([{"filename": "note.txt", "content": "aGkgdGhlcmU=", "type": "text/plain"}])
        );
    }

    #[test]
    fn mime_guessing() {
        assert_eq!(guess_mime_type("photo.JPG"), "image/jpeg");
        assert_eq!(guess_mime_type("report.pdf"), "application/pdf");
        assert_eq!(guess_mime_type("README"), "application/octet-stream");
    }

    #[test]
    fn office_and_audio_files_get_their_own_types() {
        assert_eq!(guess_mime_type("datos.csv"), "text/csv");
        assert_eq!(
            guess_mime_type("informe.docx"),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
        assert_eq!(
            guess_mime_type("tabla.xlsx"),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        let m4a = guess_mime_type("nota.m4a");
        assert!(m4a.starts_with("audio/"), "{m4a}");
        assert_eq!(guess_mime_type("clip.webm"), "video/webm");
    }

    #[tokio::test]
    async fn upload_from_path_reads_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "a,b\n1,2\n").unwrap();
        let upload = FileUpload::from_path(&path).await.unwrap();
        assert_eq!(upload.filename, "data.csv");
        assert_eq!(upload.mime_type, "text/csv");
        assert_eq!(upload.data, b"a,b\n1,2\n");
    }

    #[tokio::test]
    async fn missing_file_is_a_storage_error() {
        let err = FileUpload::from_path(Path::new("/nonexistent/parlo.bin"))
            .await
            .unwrap_err();
        assert!(matches!(err, ParloError::Storage { .. }));
    }
}

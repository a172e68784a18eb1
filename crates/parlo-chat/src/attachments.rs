// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Files staged for the next submission, each with a local preview resource.

use std::path::Path;

use parlo_core::{Attachment, ParloError, ResourceHandle, ResourceKind, ResourceRegistry};
use parlo_delivery::FileUpload;
use tracing::debug;

/// A staged file and its preview.
#[derive(Debug)]
pub struct StagedFile {
    pub upload: FileUpload,
    pub preview: ResourceHandle,
}

impl StagedFile {
    /// Metadata stored on the user message.
    pub fn attachment(&self) -> Attachment {
        Attachment {
            filename: self.upload.filename.clone(),
            mime_type: self.upload.mime_type.clone(),
            display_url: self.preview.url().to_string(),
        }
    }
}

pub struct PendingAttachments {
    registry: ResourceRegistry,
    files: Vec<StagedFile>,
}

impl PendingAttachments {
    pub fn new(registry: ResourceRegistry) -> Self {
        Self {
            registry,
            files: Vec::new(),
        }
    }

    /// Stages `upload` and allocates its preview.
    pub fn add(&mut self, upload: FileUpload) -> Attachment {
        let preview = self
            .registry
            .allocate(ResourceKind::FilePreview, upload.filename.clone());
        let staged = StagedFile { upload, preview };
        let attachment = staged.attachment();
        debug!(filename = %attachment.filename, url = %attachment.display_url, "attachment staged");
        self.files.push(staged);
        attachment
    }

    /// Reads `path` from disk and stages it.
    pub async fn add_path(&mut self, path: &Path) -> Result<Attachment, ParloError> {
        let upload = FileUpload::from_path(path).await?;
        Ok(self.add(upload))
    }

    /// Unstages the file at `index`, releasing its preview.
    pub fn remove(&mut self, index: usize) -> Result<FileUpload, ParloError> {
        if index >= self.files.len() {
            return Err(ParloError::InvalidInput(format!(
                "no staged attachment at index {index} ({} staged)",
                self.files.len()
            )));
        }
        let StagedFile { upload, preview } = self.files.remove(index);
        preview.release();
        Ok(upload)
    }

    /// Moves every staged file out, leaving the set empty.
    pub fn take(&mut self) -> Vec<StagedFile> {
        std::mem::take(&mut self.files)
    }

    pub fn attachments(&self) -> Vec<Attachment> {
        self.files.iter().map(StagedFile::attachment).collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

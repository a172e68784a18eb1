// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Locally-owned resources (file previews, audio sources) with exactly-once release.
//!
//! A [`ResourceHandle`] is released when it is dropped or passed to
//! [`ResourceHandle::release`]. Releasing consumes the handle, so a second
//! release cannot be written. The [`ResourceRegistry`] keeps the set of live
//! handles so leaks show up in tests.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use strum::Display;
use tracing::trace;
use uuid::Uuid;

/// What a resource handle backs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ResourceKind {
    FilePreview,
    AudioSource,
}

type LiveTable = Arc<DashMap<Uuid, (ResourceKind, String)>>;

/// Allocates resource handles and tracks which are still live.
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    live: LiveTable,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a new handle; `label` is kept for diagnostics (usually a filename).
    pub fn allocate(&self, kind: ResourceKind, label: impl Into<String>) -> ResourceHandle {
        let id = Uuid::new_v4();
        let label = label.into();
        let url = format!("parlo://{kind}/{id}");
        trace!(%url, %label, "allocated resource");
        self.live.insert(id, (kind, label));
        ResourceHandle {
            id,
            kind,
            url,
            live: Arc::clone(&self.live),
        }
    }

    /// Number of handles not yet released.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Number of live handles of one kind.
    pub fn live_count_of(&self, kind: ResourceKind) -> usize {
        self.live.iter().filter(|entry| entry.value().0 == kind).count()
    }
}

/// A live local resource. Released exactly once, on drop or via [`release`](Self::release).
pub struct ResourceHandle {
    id: Uuid,
    kind: ResourceKind,
    url: String,
    live: LiveTable,
}

impl ResourceHandle {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Releases the resource now.
    pub fn release(self) {
        drop(self);
    }
}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("kind", &self.kind)
            .field("url", &self.url)
            .finish()
    }
}

impl Drop for ResourceHandle {
    fn drop(&mut self) {
        if self.live.remove(&self.id).is_some() {
            trace!(url = %self.url, "released resource");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_release_on_drop_and_explicitly() {
        let registry = ResourceRegistry::new();
        let a = registry.allocate(ResourceKind::FilePreview, "cat.png");
        let b = registry.allocate(ResourceKind::AudioSource, "clip");
        assert_eq!(registry.live_count(), 2);
        assert_eq!(registry.live_count_of(ResourceKind::FilePreview), 1);
        assert!(a.url().starts_with("parlo://file-preview/"));

        a.release();
        assert_eq!(registry.live_count(), 1);

        drop(b);
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn clones_share_the_live_table() {
        let registry = ResourceRegistry::new();
        let other = registry.clone();
        let _h = other.allocate(ResourceKind::FilePreview, "doc.pdf");
        assert_eq!(registry.live_count(), 1);
    }
}

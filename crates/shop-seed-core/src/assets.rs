//! Classification of asset references found in configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::PathsConfig;

/// Where a downloaded asset is placed below the frontend output.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    ProductImage,
    Blueprint,
    MemoryImage,
}

impl AssetKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProductImage => "product_image",
            Self::Blueprint => "blueprint",
            Self::MemoryImage => "memory_image",
        }
    }

    #[must_use]
    pub fn target_dir(self, paths: &PathsConfig) -> PathBuf {
        match self {
            Self::ProductImage | Self::Blueprint => paths.product_images_dir(),
            Self::MemoryImage => paths.upload_images_dir(),
        }
    }

    /// Destination of `file_name` inside the kind's directory, or `None` when
    /// the name is not a single plain path component.
    #[must_use]
    pub fn target_path(self, paths: &PathsConfig, file_name: &str) -> Option<PathBuf> {
        is_plain_file_name(file_name).then(|| self.target_dir(paths).join(Path::new(file_name)))
    }
}

/// True when `name` names a file directly inside a directory: not empty, no
/// separators, no `.`/`..`, no NUL.
#[must_use]
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

/// True for `http://` and `https://` references.
#[must_use]
pub fn is_url(reference: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        reference.get(..scheme.len()).is_some_and(|head| head.eq_ignore_ascii_case(scheme))
    })
}

/// Last path segment of a URL, percent-decoded, without its query string.
#[must_use]
pub fn extract_filename(url: &str) -> String {
    let without_fragment = url.split('#').next().unwrap_or(url);
    let without_query = without_fragment.split('?').next().unwrap_or(without_fragment);
    let segment = without_query.rsplit('/').next().unwrap_or(without_query);
    urlencoding::decode(segment).map_or_else(|_| segment.to_string(), |decoded| decoded.into_owned())
}

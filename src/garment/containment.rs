// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Path containment checks for the trusted garment root

use std::path::{Component, Path};

/// True when `path` lies strictly beneath `root`
///
/// Both paths are expected to be absolute and canonical. The comparison is
/// component-wise, so `/srv/dresses-other` is not inside `/srv/dresses`, and
/// any remaining `..` component disqualifies the path outright.
pub fn is_descendant_of(path: &Path, root: &Path) -> bool {
    if !path.is_absolute() || !root.is_absolute() {
        return false;
    }
    if path
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::CurDir))
    {
        return false;
    }
    path != root && path.starts_with(root)
}

/// True when a relative hint consists only of plain file-name components
pub fn is_plain_relative(path: &Path) -> bool {
    let mut components = path.components().peekable();
    if components.peek().is_none() {
        return false;
    }
    components.all(|c| matches!(c, Component::Normal(_)))
}

mod s3_port_impl;
mod storage_port_impl;

pub mod fs {
    pub use super::storage_port_impl::*;
}
pub mod s3 {
    pub use super::s3_port_impl::*;
}

use std::path::{Component, Path, PathBuf};

/// Turns an object key into a relative path, rejecting anything that could leave the root.
pub(crate) fn safe_relative_key(key: &str) -> anyhow::Result<PathBuf> {
    let mut relative = PathBuf::new();
    for component in Path::new(key.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => continue,
            _ => anyhow::bail!("forbidden"),
        }
    }
    if relative.as_os_str().is_empty() {
        anyhow::bail!("forbidden");
    }
    Ok(relative)
}

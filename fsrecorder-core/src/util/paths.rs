use crate::error::Result;
use std::path::{Component, Path, PathBuf};

/// Rewrite `path` relative to `root` as a forward-slash string with no
/// leading slash. Paths stored in the log always use this form so archives
/// stay portable between operating systems.
pub fn normalize_rel(root: &Path, path: &Path) -> Result<String> {
    let rel = path.strip_prefix(root).map_err(|_| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("path {} outside watch root {}", path.display(), root.display()),
        )
    })?;

    let mut parts: Vec<String> = Vec::new();
    for c in rel.components() {
        match c {
            Component::Normal(os) => parts.push(os.to_string_lossy().into_owned()),
            Component::CurDir => {}
            other => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("unexpected path component {other:?} in {}", path.display()),
                )
                .into());
            }
        }
    }
    Ok(parts.join("/"))
}

/// Join a recorded POSIX-relative path under `root` using the platform
/// separator. Refuses absolute paths and `..` traversal.
pub fn join_under(root: &Path, rel: &str) -> Result<PathBuf> {
    if rel.starts_with('/') || rel.contains('\\') {
        return Err(
            std::io::Error::new(std::io::ErrorKind::Other, format!("unsafe path: {rel}")).into(),
        );
    }
    let mut out = root.to_path_buf();
    for part in rel.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("unsafe path: {rel}"),
            )
            .into());
        }
        out.push(part);
    }
    Ok(out)
}

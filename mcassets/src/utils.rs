use std::path::{Component, Path, PathBuf};

/**
 * Returns up to `radius` characters on either side of the position a JSON error points
 * at, so a failure in a large minified body can be located without dumping the body.
 */
pub fn json_context(err: &serde_json::Error, body: &str, radius: usize) -> String {
    let line = body
        .split('\n')
        .nth(err.line().saturating_sub(1))
        .unwrap_or_default();

    let mut offset = err.column().min(line.len());
    while !line.is_char_boundary(offset) {
        offset -= 1;
    }
    let (before, after) = line.split_at(offset);

    let before_len = before.chars().count();
    let head: String = before.chars().skip(before_len.saturating_sub(radius)).collect();
    let tail: String = after.chars().take(radius).collect();

    let mut ctx = String::new();
    if before_len > radius {
        ctx.push_str("... ");
    }
    ctx.push_str(&head);
    ctx.push_str(&tail);
    if after.chars().count() > radius {
        ctx.push_str(" ...");
    }
    ctx
}

/**
 * Lexically resolves `.` and `..` components, like `os.path.normpath` but without
 * touching the filesystem. Leading `..` on a relative path are kept.
 */
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    if normalized.as_os_str().is_empty() {
        normalized.push(".");
    }
    normalized
}

pub fn sha256_hex(contents: &[u8]) -> String {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(contents);
    format!("{:X}", hasher.finalize())
}

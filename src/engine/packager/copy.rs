use crate::engine::packager::PackageError;
use crate::utils::FileWalker;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;
use wax::{CandidatePath, Glob, Pattern};

pub fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', '{'])
}

/// Copies files under `src` matching `pattern` into `dst`, keeping their
/// relative layout. A literal pattern names one file directly under `src`
/// and must exist; a glob matches file names at any depth and may match
/// nothing. Anything under one of `skip` is left alone.
///
/// Returns the copied paths relative to `dst`.
pub async fn copy_matching(
    src: &Path,
    pattern: &str,
    dst: &Path,
    skip: &[PathBuf],
) -> Result<Vec<PathBuf>, PackageError> {
    let matches = if is_glob(pattern) {
        find_matches(src, pattern, skip).await?
    } else {
        let path = src.join(pattern);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => vec![PathBuf::from(pattern)],
            _ => {
                return Err(PackageError::MissingArtifact {
                    pattern: pattern.to_string(),
                    path,
                })
            }
        }
    };

    let mut copied = vec![];
    for relative in matches {
        let target = dst.join(&relative);

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| PackageError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        tokio::fs::copy(src.join(&relative), &target)
            .await
            .map_err(|source| PackageError::Io {
                path: target.clone(),
                source,
            })?;

        debug!(file = %relative.display(), dst = %dst.display(), "copied");
        copied.push(relative);
    }

    Ok(copied)
}

async fn find_matches(
    src: &Path,
    pattern: &str,
    skip: &[PathBuf],
) -> Result<Vec<PathBuf>, PackageError> {
    let expression = format!("**/{}", pattern);
    let glob = Glob::from_str(&expression).map_err(|e| PackageError::Pattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;

    let walker = match FileWalker::new(src).await {
        Ok(walker) => walker,
        Err(e) if e.path == src && e.source.kind() == ErrorKind::NotFound => return Ok(vec![]),
        Err(e) => return Err(e.into()),
    };

    let mut walker = walker.skip(skip);
    let mut found = vec![];
    while let Some(relative) = walker.next().await? {
        let text = candidate_text(&relative).ok_or_else(|| PackageError::Encoding {
            path: src.join(&relative),
        })?;

        if glob.is_match(CandidatePath::from(text.as_str())) {
            found.push(relative);
        }
    }

    found.sort();
    Ok(found)
}

/// `/` separated form of a relative path, or `None` if a component is not UTF-8.
fn candidate_text(relative: &Path) -> Option<String> {
    let parts = relative
        .components()
        .map(|x| x.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;

    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn touch(root: &Path, path: &str) {
        let path = root.join(path);
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(path, "x").await.unwrap();
    }

    #[tokio::test]
    async fn glob_matches_at_any_depth() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        touch(src.path(), "csio.h").await;
        touch(src.path(), "detail/stream.h").await;
        touch(src.path(), "detail/stream.cpp").await;

        let copied = copy_matching(src.path(), "*.h", dst.path(), &[]).await.unwrap();

        assert_eq!(
            copied,
            vec![PathBuf::from("csio.h"), PathBuf::from("detail/stream.h")]
        );
        assert!(dst.path().join("detail/stream.h").is_file());
        assert!(!dst.path().join("detail/stream.cpp").exists());
    }

    #[tokio::test]
    async fn glob_may_match_nothing() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();

        let copied = copy_matching(&src.path().join("missing"), "*.dll", dst.path(), &[])
            .await
            .unwrap();

        assert!(copied.is_empty());
    }

    #[tokio::test]
    async fn literal_must_exist() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();

        let err = copy_matching(src.path(), "dzip", dst.path(), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, PackageError::MissingArtifact { ref pattern, .. } if pattern == "dzip"));

        touch(src.path(), "dzip").await;
        let copied = copy_matching(src.path(), "dzip", dst.path(), &[]).await.unwrap();
        assert_eq!(copied, vec![PathBuf::from("dzip")]);
    }

    #[tokio::test]
    async fn skipped_trees_are_ignored() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        touch(src.path(), "CMakeLists.txt").await;
        touch(src.path(), ".csio/build/CMakeCache.txt").await;

        let copied = copy_matching(
            src.path(),
            "*",
            dst.path(),
            &[src.path().join(".csio")],
        )
        .await
        .unwrap();

        assert_eq!(copied, vec![PathBuf::from("CMakeLists.txt")]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unreadable_directories_fail_the_copy() {
        use std::os::unix::fs::PermissionsExt;

        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        touch(src.path(), "csio.h").await;
        touch(src.path(), "locked/hidden.h").await;

        let locked = src.path().join("locked");
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();
        if std::fs::read_dir(&locked).is_ok() {
            // permissions are not enforced for this user
            std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = copy_matching(src.path(), "*.h", dst.path(), &[]).await;
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        let err = result.unwrap_err();
        assert!(matches!(err, PackageError::Io { ref path, .. } if *path == locked));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn non_utf8_names_are_rejected() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let name = OsStr::from_bytes(b"libcsio\xff.a");
        std::fs::write(src.path().join(name), "x").unwrap();

        let err = copy_matching(src.path(), "*.a", dst.path(), &[])
            .await
            .unwrap_err();

        assert!(matches!(err, PackageError::Encoding { ref path } if *path == src.path().join(name)));
    }
}

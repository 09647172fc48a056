use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::ReadDir;
use tokio::io;

#[derive(Debug, Error)]
#[error("failed reading {}: {source}", .path.display())]
pub struct WalkError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl WalkError {
    fn at(path: &Path) -> impl FnOnce(io::Error) -> WalkError + '_ {
        move |source| WalkError {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Walks a directory tree depth first, yielding files relative to the root.
/// Directories under one of the skipped paths are not entered.
pub struct FileWalker {
    root: PathBuf,
    skip: Vec<PathBuf>,
    stack: Vec<(PathBuf, ReadDir)>,
}

impl FileWalker {
    pub async fn new(root: impl AsRef<Path>) -> Result<Self, WalkError> {
        let root = root.as_ref().to_path_buf();
        let top = tokio::fs::read_dir(&root).await.map_err(WalkError::at(&root))?;

        Ok(FileWalker {
            stack: vec![(root.clone(), top)],
            root,
            skip: vec![],
        })
    }

    pub fn skip(mut self, paths: &[PathBuf]) -> Self {
        self.skip.extend(paths.iter().cloned());
        self
    }

    pub async fn next(&mut self) -> Result<Option<PathBuf>, WalkError> {
        loop {
            let next = match self.stack.last_mut() {
                Some((dir, top)) => top.next_entry().await.map_err(WalkError::at(dir))?,
                None => return Ok(None),
            };

            let next = match next {
                Some(v) => v,
                None => {
                    self.stack.pop();
                    continue;
                }
            };

            let path = next.path();
            if self.skip.iter().any(|x| path.starts_with(x)) {
                continue;
            }

            let file_type = next.file_type().await.map_err(WalkError::at(&path))?;
            if file_type.is_dir() {
                let dir = tokio::fs::read_dir(&path).await.map_err(WalkError::at(&path))?;
                self.stack.push((path, dir));
                continue;
            }

            // symlinked directories are not followed
            if file_type.is_symlink() {
                let meta = tokio::fs::metadata(&path).await.map_err(WalkError::at(&path))?;
                if meta.is_dir() {
                    continue;
                }
            }

            let relative = path.strip_prefix(&self.root).unwrap_or(&path);
            return Ok(Some(relative.to_path_buf()));
        }
    }

    /// Every file under the root, sorted.
    pub async fn collect(mut self) -> Result<Vec<PathBuf>, WalkError> {
        let mut files = vec![];
        while let Some(file) = self.next().await? {
            files.push(file);
        }

        files.sort();
        Ok(files)
    }
}

/// Removes `path` if present and creates it again, empty.
pub async fn recreate_dir(path: &Path) -> io::Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    tokio::fs::create_dir_all(path).await
}

/// `path` anchored at the current directory when it is relative.
pub fn absolute(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn walks_nested_files() {
        let dir = TempDir::new().unwrap();
        tokio::fs::create_dir_all(dir.path().join("a/b")).await.unwrap();
        tokio::fs::write(dir.path().join("a/b/c.h"), "").await.unwrap();
        tokio::fs::write(dir.path().join("top.txt"), "").await.unwrap();

        let files = FileWalker::new(dir.path()).await.unwrap().collect().await.unwrap();

        assert_eq!(files, vec![PathBuf::from("a/b/c.h"), PathBuf::from("top.txt")]);
    }

    #[tokio::test]
    async fn skipped_directories_are_not_entered() {
        let dir = TempDir::new().unwrap();
        tokio::fs::create_dir_all(dir.path().join(".csio/build")).await.unwrap();
        tokio::fs::write(dir.path().join(".csio/build/CMakeCache.txt"), "").await.unwrap();
        tokio::fs::write(dir.path().join("CMakeLists.txt"), "").await.unwrap();

        let files = FileWalker::new(dir.path())
            .await
            .unwrap()
            .skip(&[dir.path().join(".csio")])
            .collect()
            .await
            .unwrap();

        assert_eq!(files, vec![PathBuf::from("CMakeLists.txt")]);
    }

    #[tokio::test]
    async fn missing_root_names_the_path() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");

        let err = FileWalker::new(&missing).await.err().unwrap();

        assert_eq!(err.path, missing);
        assert_eq!(err.source.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn recreate_empties_the_directory() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("pkg");

        recreate_dir(&target).await.unwrap();
        tokio::fs::write(target.join("stale"), "").await.unwrap();
        recreate_dir(&target).await.unwrap();

        assert!(target.is_dir());
        assert!(!target.join("stale").exists());
    }
}

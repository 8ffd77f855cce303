//! All-or-nothing output writing.
//!
//! Every file of a run is first staged under a unique temporary name next to
//! its target. Only when all of them are staged are they renamed into place.
//! A failure at any point removes whatever this run has put on disk.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

const TMP_MARKER: &str = ".loomtmp.";

static TMP_COUNTER: AtomicU64 = AtomicU64::new(1);

/// A file to write, relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub relative: PathBuf,
    pub bytes: Vec<u8>,
}

impl OutputFile {
    pub fn new(relative: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) -> Self {
        Self { relative: relative.into(), bytes: bytes.into() }
    }
}

/// Write `files` under `out_dir`, returning the final paths in input order.
pub async fn write_all_or_nothing(out_dir: &Path, files: &[OutputFile]) -> io::Result<Vec<PathBuf>> {
    let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(files.len());

    for file in files {
        let target = out_dir.join(&file.relative);
        let temp = unique_tmp_path(&target);
        let result = async {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).await?;
            }
            stage(&temp, &file.bytes).await
        }
        .await;

        if let Err(err) = result {
            remove_quietly(&temp).await;
            discard(staged.iter().map(|(temp, _)| temp.as_path())).await;
            return Err(err);
        }
        staged.push((temp, target));
    }

    for (done, (temp, target)) in staged.iter().enumerate() {
        if let Err(err) = fs::rename(temp, target).await {
            discard(staged[..done].iter().map(|(_, target)| target.as_path())).await;
            discard(staged[done..].iter().map(|(temp, _)| temp.as_path())).await;
            return Err(err);
        }
    }

    debug!(dir = %out_dir.display(), files = staged.len(), "wrote output files");
    Ok(staged.into_iter().map(|(_, target)| target).collect())
}

async fn stage(temp: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(temp)
        .await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

async fn discard<'a>(paths: impl Iterator<Item = &'a Path>) {
    for path in paths {
        remove_quietly(path).await;
    }
}

async fn remove_quietly(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => warn!(path = %path.display(), error = %err, "failed to remove staged file"),
    }
}

fn unique_tmp_path(target: &Path) -> PathBuf {
    let counter = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let file_name = target.file_name().and_then(|s| s.to_str()).unwrap_or("artifact");
    target.with_file_name(format!("{file_name}{TMP_MARKER}{}.{counter}", std::process::id()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = walk(dir)
            .into_iter()
            .map(|p| p.strip_prefix(dir).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        names.sort();
        names
    }

    fn walk(dir: &Path) -> Vec<PathBuf> {
        let mut out = Vec::new();
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                out.extend(walk(&path));
            } else {
                out.push(path);
            }
        }
        out
    }

    #[tokio::test]
    async fn test_writes_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            OutputFile::new("Card.tsx", "tsx"),
            OutputFile::new("assets/a.png", vec![1u8, 2, 3]),
        ];

        let written = write_all_or_nothing(dir.path(), &files).await.unwrap();
        assert_eq!(written, vec![dir.path().join("Card.tsx"), dir.path().join("assets/a.png")]);
        assert_eq!(listing(dir.path()), vec!["Card.tsx", "assets/a.png"]);
        assert_eq!(std::fs::read(dir.path().join("assets/a.png")).unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_replaces_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Card.tsx"), "old").unwrap();

        write_all_or_nothing(dir.path(), &[OutputFile::new("Card.tsx", "new")]).await.unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("Card.tsx")).unwrap(), "new");
    }

    #[tokio::test]
    async fn test_failure_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        // A plain file where a directory is needed makes the second file fail.
        std::fs::write(dir.path().join("assets"), "in the way").unwrap();
        let files = vec![
            OutputFile::new("Card.tsx", "tsx"),
            OutputFile::new("assets/a.png", vec![1u8]),
        ];

        assert!(write_all_or_nothing(dir.path(), &files).await.is_err());
        assert_eq!(listing(dir.path()), vec!["assets"]);
    }
}

//! ZIP Archive Repository Implementation
//!
//! ArchiveRepositoryのZIP実装
//!
//! セッションのファイルディレクトリを一時領域の固定名フォルダにコピーし、
//! その一時領域ごとZIP化する。一時領域は成功・失敗にかかわらず削除される。

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::info;
use std::fs::{self, File};
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::domain::repositories::archive_repository::ArchiveRepository;

/// ZIPベースのアーカイブリポジトリ
pub struct ZipArchiveRepository {
    folder_name: String,
    staging_parent: Option<PathBuf>,
}

impl ZipArchiveRepository {
    /// 新しいリポジトリを作成
    ///
    /// # Arguments
    ///
    /// * `folder_name` - アーカイブのルートに置くフォルダ名
    pub fn new(folder_name: String) -> Self {
        Self {
            folder_name,
            staging_parent: None,
        }
    }

    /// 一時領域を作るディレクトリを指定する（既定はOSの一時ディレクトリ）
    pub fn with_staging_parent(mut self, staging_parent: PathBuf) -> Self {
        self.staging_parent = Some(staging_parent);
        self
    }

    /// アーカイブを作成する（同期処理）
    fn package_sync(
        source_dir: &Path,
        folder_name: &str,
        staging_parent: Option<&Path>,
    ) -> Result<Vec<u8>> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("imgbundle-staging-");
        let staging = match staging_parent {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        }
        .context("Failed to create staging directory")?;

        let staged_root = staging.path().join(folder_name);
        copy_tree(source_dir, &staged_root)?;
        let bytes = zip_tree(staging.path())?;

        info!(
            "Packaged {} into archive ({} bytes)",
            source_dir.display(),
            bytes.len()
        );

        // `staging` is removed on drop, including the early-return error paths above
        Ok(bytes)
    }
}

/// `src` 配下をそのまま `dst` にコピー
fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    if !src.is_dir() {
        anyhow::bail!("Source directory does not exist: {}", src.display());
    }
    fs::create_dir_all(dst).context(format!("Failed to create {}", dst.display()))?;

    for entry in WalkDir::new(src).min_depth(1).sort_by_file_name() {
        let entry = entry.context("Failed to walk source directory")?;
        let relative = entry.path().strip_prefix(src)?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .context(format!("Failed to create {}", target.display()))?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &target)
                .context(format!("Failed to copy {}", entry.path().display()))?;
        }
    }

    Ok(())
}

/// アーカイブ内のエントリ名（`/` 区切り）
fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// `root` 配下をZIP化（`root` 自体はアーカイブに含めない）
fn zip_tree(root: &Path) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let file_options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);
    let dir_options = SimpleFileOptions::default();

    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry.context("Failed to walk staging directory")?;
        let name = entry_name(entry.path().strip_prefix(root)?);

        if entry.file_type().is_dir() {
            writer
                .add_directory(format!("{}/", name), dir_options)
                .context(format!("Failed to add directory {}", name))?;
        } else if entry.file_type().is_file() {
            writer
                .start_file(name.clone(), file_options)
                .context(format!("Failed to add file {}", name))?;
            let mut file = File::open(entry.path())
                .context(format!("Failed to open {}", entry.path().display()))?;
            io::copy(&mut file, &mut writer).context(format!("Failed to write {}", name))?;
        }
    }

    let cursor = writer.finish().context("Failed to finish archive")?;
    Ok(cursor.into_inner())
}

#[async_trait]
impl ArchiveRepository for ZipArchiveRepository {
    async fn package(&self, source_dir: &Path) -> Result<Vec<u8>> {
        let source_dir = source_dir.to_path_buf();
        let folder_name = self.folder_name.clone();
        let staging_parent = self.staging_parent.clone();
        tokio::task::spawn_blocking(move || {
            Self::package_sync(&source_dir, &folder_name, staging_parent.as_deref())
        })
        .await
        .map_err(|e| anyhow::anyhow!("Failed to spawn blocking task: {}", e))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::io::Read;
    use tempfile::TempDir;
    use zip::ZipArchive;

    fn write(root: &Path, relative: &str, content: &[u8]) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn archive_names(bytes: &[u8]) -> Vec<String> {
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        archive.file_names().map(str::to_string).collect()
    }

    #[tokio::test]
    async fn test_package_preserves_relative_paths_under_single_folder() {
        let source = TempDir::new().unwrap();
        write(source.path(), "bundle of 2/B1-h1.jpg", b"b1");
        write(source.path(), "mixed_sets/B2/200.jpg", b"200");
        write(source.path(), "cross_country/B3-p1-fr.jpg", b"fr");

        let repo = ZipArchiveRepository::new("bundle_images".to_string());
        let bytes = repo.package(source.path()).await.unwrap();

        let names = archive_names(&bytes);
        let top_level: BTreeSet<_> = names
            .iter()
            .map(|n| n.split('/').next().unwrap().to_string())
            .collect();
        assert_eq!(top_level, BTreeSet::from(["bundle_images".to_string()]));

        for expected in [
            "bundle_images/bundle of 2/B1-h1.jpg",
            "bundle_images/mixed_sets/B2/200.jpg",
            "bundle_images/cross_country/B3-p1-fr.jpg",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {}", expected);
        }

        let mut archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let mut content = Vec::new();
        archive
            .by_name("bundle_images/mixed_sets/B2/200.jpg")
            .unwrap()
            .read_to_end(&mut content)
            .unwrap();
        assert_eq!(content, b"200");
    }

    #[tokio::test]
    async fn test_package_empty_directory() {
        let source = TempDir::new().unwrap();
        let repo = ZipArchiveRepository::new("export".to_string());

        let bytes = repo.package(source.path()).await.unwrap();

        assert_eq!(archive_names(&bytes), vec!["export/"]);
    }

    #[tokio::test]
    async fn test_staging_is_cleaned_up_on_success() {
        let source = TempDir::new().unwrap();
        write(source.path(), "products/1.jpg", b"1");
        let staging = TempDir::new().unwrap();

        let repo = ZipArchiveRepository::new("bundle_images".to_string())
            .with_staging_parent(staging.path().to_path_buf());
        repo.package(source.path()).await.unwrap();

        assert_eq!(fs::read_dir(staging.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_staging_is_cleaned_up_on_failure() {
        let staging = TempDir::new().unwrap();
        let repo = ZipArchiveRepository::new("bundle_images".to_string())
            .with_staging_parent(staging.path().to_path_buf());

        let result = repo.package(Path::new("/nonexistent/imgbundle/files")).await;

        assert!(result.is_err());
        assert_eq!(fs::read_dir(staging.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_entry_name_uses_forward_slashes() {
        let path: PathBuf = ["a", "b c", "d.jpg"].iter().collect();
        assert_eq!(entry_name(&path), "a/b c/d.jpg");
    }
}

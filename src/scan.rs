//! 站点目录扫描：按忽略名单裁剪后收集待上传文件。

use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileEntry {
    /// 以 `/` 分隔的相对路径，同时用作上传表单字段名。
    pub relative_path: String,
    pub absolute_path: PathBuf,
}

/// 名称是否在忽略名单中（精确匹配，无通配）。
pub fn is_ignored(name: &str, ignore: &[&str]) -> bool {
    ignore.contains(&name)
}

/// 遍历 `root`，按稳定顺序返回未被忽略的文件。
///
/// 被忽略的目录在进入前即被裁剪；不跟随目录符号链接，指向普通文件的链接照常收集。
pub fn scan_files(root: &Path, ignore: &[&str]) -> Vec<FileEntry> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !entry_ignored(e, ignore))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        let path = entry.path();
        if entry.file_type().is_dir() || !path.is_file() {
            continue;
        }

        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let relative_path = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        debug!(path = relative_path, "discovered file");

        files.push(FileEntry {
            relative_path,
            absolute_path: path.to_path_buf(),
        });
    }

    files
}

fn entry_ignored(entry: &DirEntry, ignore: &[&str]) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| is_ignored(name, ignore))
}

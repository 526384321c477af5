use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;
use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

const TRAVERSAL_MESSAGE: &str = "Security Error: Path traversal attempt";

#[derive(Clone, Debug)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// 转为绝对路径并按字面折叠 `.`/`..`，不访问文件系统。
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        let absolute = std::path::absolute(root)?;
        Ok(Self {
            root: normalize_lexically(&absolute),
        })
    }

    pub fn root_path(&self) -> &Path {
        &self.root
    }

    /// 将相对路径解析到根目录下。
    ///
    /// 仅比较字符串前缀：`<root>-old/x` 这类同前缀兄弟目录会被放行，`../x` 不会。
    pub fn resolve_checked(&self, relative: &str) -> Result<PathBuf, StorageError> {
        let target = normalize_lexically(&self.root.join(relative));
        let root = self.root.to_string_lossy();
        if !target.to_string_lossy().starts_with(root.as_ref()) {
            return Err(StorageError::PathTraversal);
        }
        Ok(target)
    }

    /// 以 4 空格缩进的 JSON 覆盖写入目标文件。
    pub async fn write_json(&self, relative: &str, content: &Value) -> Result<PathBuf, StorageError> {
        let target = self.resolve_checked(relative)?;
        let rendered = render_json(content)?;
        fs::write(&target, rendered).await?;
        Ok(target)
    }

    /// 列出目录内容，按名称不区分大小写排序。
    pub async fn list_dir(&self, relative: &str) -> Result<Vec<ListingEntry>, StorageError> {
        let target = self.resolve_checked(relative)?;
        let mut dir = fs::read_dir(&target).await?;
        let mut entries = Vec::new();

        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            let is_dir = fs::metadata(entry.path())
                .await
                .map(|metadata| metadata.is_dir())
                .unwrap_or(false);
            entries.push(ListingEntry { name, is_dir });
        }

        entries.sort_by_key(|entry| entry.name.to_lowercase());
        Ok(entries)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub is_dir: bool,
}

fn render_json(content: &Value) -> Result<Vec<u8>, StorageError> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    content.serialize(&mut serializer)?;
    Ok(buffer)
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => continue,
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

#[derive(Debug)]
pub enum StorageError {
    PathTraversal,
    Serialize(serde_json::Error),
    Io(io::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::PathTraversal => f.write_str(TRAVERSAL_MESSAGE),
            StorageError::Serialize(err) => write!(f, "{err}"),
            StorageError::Io(err) => write!(f, "{err}"),
        }
    }
}

impl From<io::Error> for StorageError {
    fn from(err: io::Error) -> Self {
        StorageError::Io(err)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialize(err)
    }
}

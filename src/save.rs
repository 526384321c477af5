//! 管理面板的 `POST /save` 处理器。

use axum::body::Bytes;
use axum::extract::Extension;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{error, info};

use crate::error::ApiError;
use crate::storage::Storage;

pub const SAVED_BODY: &str = "Saved Successfully";

/// 请求体：`file` 必须为字符串，缺省的 `content` 视为 `null`；重复键以后者为准。
pub(crate) struct SaveRequest {
    file: String,
    content: Value,
}

impl SaveRequest {
    fn parse(body: &[u8]) -> Result<Self, ApiError> {
        let mut fields: Map<String, Value> = serde_json::from_slice(body)?;
        let file = match fields.remove("file") {
            Some(Value::String(file)) => file,
            Some(_) => return Err(ApiError::Internal("`file` must be a string".into())),
            None => return Err(ApiError::Internal("missing field `file`".into())),
        };
        let content = fields.remove("content").unwrap_or(Value::Null);
        Ok(Self { file, content })
    }
}

/// 以缩进 JSON 覆盖写入目标文件；任何失败都回 500 与错误文本。
pub async fn save_file(
    Extension(storage): Extension<Arc<Storage>>,
    body: Bytes,
) -> Result<&'static str, ApiError> {
    match persist(&storage, &body).await {
        Ok(file) => {
            info!(file, "saved file");
            Ok(SAVED_BODY)
        }
        Err(err) => {
            error!(error = err.message(), "save failed");
            Err(err)
        }
    }
}

async fn persist(storage: &Storage, body: &[u8]) -> Result<String, ApiError> {
    let SaveRequest { file, content } = SaveRequest::parse(body)?;
    storage.write_json(&file, &content).await?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_storage() -> (tempfile::TempDir, Arc<Storage>) {
        let temp = tempdir().expect("tempdir");
        let root = temp.path().join("site");
        std::fs::create_dir_all(&root).expect("create site root");
        let storage = Storage::new(root).expect("storage");
        (temp, Arc::new(storage))
    }

    #[tokio::test]
    async fn save_file_writes_indented_json() {
        let (_temp, storage) = make_storage();
        let result = save_file(
            Extension(storage.clone()),
            Bytes::from_static(br#"{"file": "notes.json", "content": {"a": 1}}"#),
        )
        .await;

        assert_eq!(result.expect("saved"), SAVED_BODY);
        let written =
            std::fs::read_to_string(storage.root_path().join("notes.json")).expect("read");
        assert_eq!(written, "{\n    \"a\": 1\n}");
    }

    #[tokio::test]
    async fn save_file_rejects_traversal_path() {
        let (temp, storage) = make_storage();
        let result = save_file(
            Extension(storage),
            Bytes::from_static(br#"{"file": "../outside.json", "content": 1}"#),
        )
        .await;

        let err = result.expect_err("traversal must fail");
        assert!(matches!(err, ApiError::Internal(_)));
        assert_eq!(err.message(), "Security Error: Path traversal attempt");
        assert!(!temp.path().join("outside.json").exists());
    }

    #[tokio::test]
    async fn save_file_leaves_target_untouched_on_malformed_body() {
        let (_temp, storage) = make_storage();
        let target = storage.root_path().join("notes.json");
        std::fs::write(&target, "original").expect("seed");

        let result = save_file(
            Extension(storage),
            Bytes::from_static(br#"{"file": "notes.json", "content": "#),
        )
        .await;

        assert!(matches!(result, Err(ApiError::Internal(_))));
        assert_eq!(std::fs::read_to_string(&target).expect("read"), "original");
    }

    #[tokio::test]
    async fn save_file_requires_file_key() {
        let (_temp, storage) = make_storage();
        let result = save_file(
            Extension(storage),
            Bytes::from_static(br#"{"content": {"a": 1}}"#),
        )
        .await;

        let err = result.expect_err("missing file key");
        assert!(err.message().contains("file"));
    }

    #[tokio::test]
    async fn save_file_writes_null_when_content_missing() {
        let (_temp, storage) = make_storage();
        save_file(
            Extension(storage.clone()),
            Bytes::from_static(br#"{"file": "empty.json"}"#),
        )
        .await
        .expect("saved");

        let written =
            std::fs::read_to_string(storage.root_path().join("empty.json")).expect("read");
        assert_eq!(written, "null");
    }

    #[tokio::test]
    async fn save_file_rejects_non_object_body() {
        let (_temp, storage) = make_storage();
        let result = save_file(
            Extension(storage.clone()),
            Bytes::from_static(br#"["arr.json", {"a": 1}]"#),
        )
        .await;

        assert!(matches!(result, Err(ApiError::Internal(_))));
        assert!(!storage.root_path().join("arr.json").exists());
    }

    #[tokio::test]
    async fn save_file_rejects_non_string_file() {
        let (_temp, storage) = make_storage();
        let result = save_file(
            Extension(storage),
            Bytes::from_static(br#"{"file": 7, "content": {}}"#),
        )
        .await;

        let err = result.expect_err("numeric file name");
        assert_eq!(err.message(), "`file` must be a string");
    }

    #[tokio::test]
    async fn save_file_uses_last_duplicate_key() {
        let (_temp, storage) = make_storage();
        save_file(
            Extension(storage.clone()),
            Bytes::from_static(br#"{"file": "first.json", "file": "second.json", "content": 2}"#),
        )
        .await
        .expect("saved");

        assert!(!storage.root_path().join("first.json").exists());
        let written =
            std::fs::read_to_string(storage.root_path().join("second.json")).expect("read");
        assert_eq!(written, "2");
    }

    #[tokio::test]
    async fn save_file_keeps_big_integers_exact() {
        let (_temp, storage) = make_storage();
        save_file(
            Extension(storage.clone()),
            Bytes::from_static(br#"{"file": "ids.json", "content": {"id": 123456789012345678901234567890}}"#),
        )
        .await
        .expect("saved");

        let written =
            std::fs::read_to_string(storage.root_path().join("ids.json")).expect("read");
        assert_eq!(written, "{\n    \"id\": 123456789012345678901234567890\n}");
    }
}

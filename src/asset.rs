// 该文件是 Fenlei （分类） 项目的一部分。
// src/asset.rs - 模型资源目录
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, error};

/// 默认的模型资源名称
pub const DEFAULT_MODEL_NAME: &str = "keras_model.tflite";

#[derive(Error, Debug)]
pub enum AssetError {
  #[error("无效的资源名称: '{0}'")]
  InvalidName(String),
  #[error("模型资源不存在: {0}")]
  Missing(PathBuf),
  #[error("无法读取模型资源 {path}: {source}")]
  Unreadable {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// 按名称查找模型文件的资源目录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetStore {
  root: PathBuf,
}

impl AssetStore {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// 将模型文件路径拆分为资源目录与资源名称
  pub fn split(path: impl AsRef<Path>) -> Result<(Self, String), AssetError> {
    let path = path.as_ref();
    let name = path
      .file_name()
      .and_then(|name| name.to_str())
      .ok_or_else(|| AssetError::InvalidName(path.display().to_string()))?;
    let root = match path.parent() {
      Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
      _ => PathBuf::from("."),
    };
    Ok((Self::new(root), name.to_string()))
  }

  /// 查找资源，返回其完整路径
  ///
  /// 资源名称只能是目录下的单个文件名，不允许包含路径分隔符。
  pub fn resolve(&self, name: &str) -> Result<PathBuf, AssetError> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
      error!("资源名称无效: '{}'", name);
      return Err(AssetError::InvalidName(name.to_string()));
    }

    let path = self.root.join(name);
    match std::fs::metadata(&path) {
      Ok(meta) if meta.is_file() => {
        debug!(
          "找到模型资源: {} ({:.2} MB)",
          path.display(),
          meta.len() as f64 / (1024.0 * 1024.0)
        );
        Ok(path)
      }
      Ok(_) => Err(AssetError::Missing(path)),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AssetError::Missing(path)),
      Err(source) => Err(AssetError::Unreadable { path, source }),
    }
  }
}

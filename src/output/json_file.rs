// 该文件是 Fenlei （分类） 项目的一部分。
// src/output/json_file.rs - 保存 JSON 结果文件
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

use std::path::Path;

use chrono::Utc;
use image::DynamicImage;
use serde_json::json;
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  label::Labels,
  model::ClassificationResult,
  output::{Render, label_of},
  url_file_path,
};

#[derive(Error, Debug)]
pub enum JsonFileOutputError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

pub struct JsonFileOutput {
  path: String,
  labels: Option<Labels>,
}

impl FromUrlWithScheme for JsonFileOutput {
  const SCHEME: &'static str = "json";
}

impl FromUrl for JsonFileOutput {
  type Error = JsonFileOutputError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(JsonFileOutputError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    Ok(JsonFileOutput {
      path: url_file_path(uri),
      labels: None,
    })
  }
}

impl JsonFileOutput {
  pub fn with_labels(mut self, labels: Option<Labels>) -> Self {
    self.labels = labels;
    self
  }

  fn record(&self, frame: &DynamicImage, result: &ClassificationResult) -> serde_json::Value {
    json!({
      "class_index": result.class_index,
      "score": result.score,
      "label": label_of(self.labels.as_ref(), result),
      "image": { "width": frame.width(), "height": frame.height() },
      "timestamp": Utc::now().to_rfc3339(),
    })
  }
}

impl Render<DynamicImage, ClassificationResult> for JsonFileOutput {
  type Error = JsonFileOutputError;

  fn render_result(
    &self,
    frame: &DynamicImage,
    result: &ClassificationResult,
  ) -> Result<(), Self::Error> {
    if let Some(parent) = Path::new(&self.path).parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    let text = serde_json::to_string_pretty(&self.record(frame, result))?;
    std::fs::write(&self.path, text)?;

    warn!("保存分类结果到文件: {}", self.path);

    Ok(())
  }
}

// 该文件是 Fenlei （分类） 项目的一部分。
// src/output/log_output.rs - 日志输出
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

use std::convert::Infallible;

use image::DynamicImage;
use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  label::Labels,
  model::ClassificationResult,
  output::{Render, label_of},
};

#[derive(Debug, Default)]
pub struct LogOutput {
  labels: Option<Labels>,
}

impl FromUrlWithScheme for LogOutput {
  const SCHEME: &'static str = "log";
}

impl FromUrl for LogOutput {
  type Error = Infallible;

  fn from_url(_url: &Url) -> Result<Self, Self::Error> {
    Ok(LogOutput::default())
  }
}

impl LogOutput {
  pub fn with_labels(mut self, labels: Option<Labels>) -> Self {
    self.labels = labels;
    self
  }
}

impl Render<DynamicImage, ClassificationResult> for LogOutput {
  type Error = Infallible;

  fn render_result(
    &self,
    frame: &DynamicImage,
    result: &ClassificationResult,
  ) -> Result<(), Self::Error> {
    match label_of(self.labels.as_ref(), result) {
      Some(label) => info!(
        "分类结果 ({}x{}): {} [{}], 得分 {:.4}",
        frame.width(),
        frame.height(),
        label,
        result.class_index,
        result.score
      ),
      None => info!(
        "分类结果 ({}x{}): 类别 {}, 得分 {:.4}",
        frame.width(),
        frame.height(),
        result.class_index,
        result.score
      ),
    }
    Ok(())
  }
}

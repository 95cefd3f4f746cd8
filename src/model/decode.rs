// 该文件是 Fenlei （分类） 项目的一部分。
// src/model/decode.rs - 分类结果解码
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

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
  #[error("模型输出为空")]
  Empty,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationResult {
  pub class_index: usize,
  /// 模型原始得分，未经 softmax
  pub score: f32,
}

/// 取最大得分的类别，得分相同时取下标最小者
pub fn decode(scores: &[f32]) -> Result<ClassificationResult, DecodeError> {
  let (&first, rest) = scores.split_first().ok_or(DecodeError::Empty)?;

  let mut class_index = 0;
  let mut score = first;
  for (i, &value) in rest.iter().enumerate() {
    if value > score {
      class_index = i + 1;
      score = value;
    }
  }

  Ok(ClassificationResult { class_index, score })
}

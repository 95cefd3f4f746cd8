// 该文件是 Fenlei （分类） 项目的一部分。
// src/model/shape.rs - 模型输入输出形状
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
use tracing::{debug, error};

use crate::engine::InferenceEngine;

// 输入形状按 (通道, 宽, 高) 的下标读取
const INPUT_CHANNEL_AXIS: usize = 0;
const INPUT_WIDTH_AXIS: usize = 1;
const INPUT_HEIGHT_AXIS: usize = 2;
const INPUT_MIN_RANK: usize = 3;
const OUTPUT_CLASS_AXIS: usize = 1;
const OUTPUT_MIN_RANK: usize = 2;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ShapeError {
  #[error("模型没有输入张量")]
  NoInput,
  #[error("模型没有输出张量")]
  NoOutput,
  #[error("输入张量形状 {0:?} 维数不足, 至少需要 3 维")]
  InputRank(Vec<usize>),
  #[error("输出张量形状 {0:?} 维数不足, 至少需要 2 维")]
  OutputRank(Vec<usize>),
  #[error("模型形状包含零维度: 宽 {width}, 高 {height}, 通道 {channels}, 类别 {classes}")]
  ZeroDimension {
    width: usize,
    height: usize,
    channels: usize,
    classes: usize,
  },
  #[error("模型输入尺寸 {width}x{height} 超出图像尺寸上限")]
  SizeOverflow { width: usize, height: usize },
}

/// 模型要求的输入尺寸与输出类别数，加载后解析一次，之后不再变化
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelShape {
  input_width: u32,
  input_height: u32,
  input_channels: usize,
  output_classes: usize,
}

impl ModelShape {
  pub fn new(
    width: usize,
    height: usize,
    channels: usize,
    classes: usize,
  ) -> Result<Self, ShapeError> {
    if width == 0 || height == 0 || channels == 0 || classes == 0 {
      return Err(ShapeError::ZeroDimension {
        width,
        height,
        channels,
        classes,
      });
    }

    let (Ok(input_width), Ok(input_height)) = (u32::try_from(width), u32::try_from(height)) else {
      return Err(ShapeError::SizeOverflow { width, height });
    };

    Ok(Self {
      input_width,
      input_height,
      input_channels: channels,
      output_classes: classes,
    })
  }

  /// 从推理引擎的第一个输入、第一个输出张量解析形状
  pub fn resolve<E: InferenceEngine + ?Sized>(engine: &E) -> Result<Self, ShapeError> {
    let inputs = engine.input_shapes();
    let input = inputs.first().ok_or_else(|| {
      error!("模型没有输入张量");
      ShapeError::NoInput
    })?;
    if input.len() < INPUT_MIN_RANK {
      error!("输入张量形状维数不足: {:?}", input);
      return Err(ShapeError::InputRank(input.clone()));
    }

    let outputs = engine.output_shapes();
    let output = outputs.first().ok_or_else(|| {
      error!("模型没有输出张量");
      ShapeError::NoOutput
    })?;
    if output.len() < OUTPUT_MIN_RANK {
      error!("输出张量形状维数不足: {:?}", output);
      return Err(ShapeError::OutputRank(output.clone()));
    }

    let shape = Self::new(
      input[INPUT_WIDTH_AXIS],
      input[INPUT_HEIGHT_AXIS],
      input[INPUT_CHANNEL_AXIS],
      output[OUTPUT_CLASS_AXIS],
    )?;
    debug!("模型形状: {:?}", shape);

    Ok(shape)
  }

  pub fn input_width(&self) -> usize {
    self.input_width as usize
  }

  pub fn input_height(&self) -> usize {
    self.input_height as usize
  }

  /// 图像缩放使用的目标尺寸 (宽, 高)
  pub fn input_size(&self) -> (u32, u32) {
    (self.input_width, self.input_height)
  }

  pub fn input_channels(&self) -> usize {
    self.input_channels
  }

  pub fn output_classes(&self) -> usize {
    self.output_classes
  }

  pub fn input_pixels(&self) -> usize {
    self.input_width() * self.input_height()
  }
}

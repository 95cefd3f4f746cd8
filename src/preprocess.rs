// 该文件是 Fenlei （分类） 项目的一部分。
// src/preprocess.rs - 图像到张量的预处理
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

use std::str::FromStr;

use image::{DynamicImage, Rgb, RgbImage, imageops::FilterType};
use thiserror::Error;
use tracing::{debug, error};

use crate::model::ModelShape;

const GRAY_CHANNELS: usize = 1;
const RGB_CHANNELS: usize = 3;
const PIXEL_MAX: f32 = 255.0;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PreprocessError {
  #[error("图像尺寸无效: {width}x{height}")]
  EmptyImage { width: u32, height: u32 },
  #[error("不支持的输入通道数: {0}")]
  UnsupportedChannels(usize),
  #[error("未知的通道策略: '{0}'")]
  UnknownPolicy(String),
}

/// 输入张量的通道编码方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChannelPolicy {
  /// 不看模型声明的通道数，一律转为单通道平均灰度
  #[default]
  Grayscale,
  /// 按模型声明的通道数编码：1 为灰度，3 为逐像素交错的 R、G、B
  FromModel,
}

impl ChannelPolicy {
  /// 该策略下每个像素占用的浮点数个数
  pub fn channels_for(self, shape: &ModelShape) -> Result<usize, PreprocessError> {
    match self {
      ChannelPolicy::Grayscale => Ok(GRAY_CHANNELS),
      ChannelPolicy::FromModel => match shape.input_channels() {
        GRAY_CHANNELS => Ok(GRAY_CHANNELS),
        RGB_CHANNELS => Ok(RGB_CHANNELS),
        other => Err(PreprocessError::UnsupportedChannels(other)),
      },
    }
  }
}

impl FromStr for ChannelPolicy {
  type Err = PreprocessError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "gray" | "grayscale" => Ok(ChannelPolicy::Grayscale),
      "model" => Ok(ChannelPolicy::FromModel),
      other => Err(PreprocessError::UnknownPolicy(other.to_string())),
    }
  }
}

/// 归一化后的模型输入，行优先排列，每个值位于 [0.0, 1.0]
#[derive(Debug, Clone, PartialEq)]
pub struct InputBuffer {
  data: Vec<f32>,
}

impl InputBuffer {
  pub fn len(&self) -> usize {
    self.data.len()
  }

  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  pub fn as_slice(&self) -> &[f32] {
    &self.data
  }

  pub fn into_inner(self) -> Vec<f32> {
    self.data
  }

  /// 按本机字节序展开为字节流
  pub fn to_ne_bytes(&self) -> Vec<u8> {
    self.data.iter().flat_map(|v| v.to_ne_bytes()).collect()
  }
}

impl AsRef<[f32]> for InputBuffer {
  fn as_ref(&self) -> &[f32] {
    &self.data
  }
}

/// 最近邻缩放到指定尺寸，不保持宽高比，丢弃 alpha 通道
pub fn resize(image: &DynamicImage, width: u32, height: u32) -> RgbImage {
  if image.width() == width && image.height() == height {
    return image.to_rgb8();
  }
  image
    .resize_exact(width, height, FilterType::Nearest)
    .to_rgb8()
}

/// 以强制灰度方式准备模型输入
pub fn prepare(image: &DynamicImage, shape: &ModelShape) -> Result<InputBuffer, PreprocessError> {
  prepare_with(image, shape, ChannelPolicy::Grayscale)
}

pub fn prepare_with(
  image: &DynamicImage,
  shape: &ModelShape,
  policy: ChannelPolicy,
) -> Result<InputBuffer, PreprocessError> {
  let (width, height) = (image.width(), image.height());
  if width == 0 || height == 0 {
    error!("输入图像尺寸无效: {}x{}", width, height);
    return Err(PreprocessError::EmptyImage { width, height });
  }

  let channels = policy.channels_for(shape)?;
  let (target_w, target_h) = shape.input_size();
  debug!(
    "缩放图像 {}x{} -> {}x{}, 通道数 {}",
    width, height, target_w, target_h, channels
  );
  let resized = resize(image, target_w, target_h);

  let mut data = Vec::with_capacity(shape.input_pixels() * channels);
  for pixel in resized.pixels() {
    if channels == RGB_CHANNELS {
      data.extend(pixel.0.iter().map(|&c| c as f32 / PIXEL_MAX));
    } else {
      data.push(gray_value(pixel));
    }
  }

  Ok(InputBuffer { data })
}

// 整数求和后再做浮点除法
fn gray_value(pixel: &Rgb<u8>) -> f32 {
  let [r, g, b] = pixel.0;
  let avg = (r as u32 + g as u32 + b as u32) as f32 / 3.0;
  avg / PIXEL_MAX
}

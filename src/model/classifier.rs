// 该文件是 Fenlei （分类） 项目的一部分。
// src/model/classifier.rs - 单图分类器
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

use image::DynamicImage;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
  engine::{EngineError, EngineLoader, InferenceEngine},
  model::{
    Model,
    decode::{ClassificationResult, DecodeError, decode},
    shape::{ModelShape, ShapeError},
  },
  preprocess::{ChannelPolicy, InputBuffer, PreprocessError, prepare_with},
};

#[derive(Error, Debug)]
pub enum InitError {
  #[error("模型加载错误: {0}")]
  Load(#[from] EngineError),
  #[error("模型形状无效: {0}")]
  Shape(#[from] ShapeError),
  #[error("模型输入编码不受支持: {0}")]
  Channels(#[from] PreprocessError),
}

#[derive(Error, Debug)]
pub enum ClassifyError {
  #[error("分类器尚未初始化")]
  NotInitialized,
  #[error("输入图像无效: {0}")]
  InvalidInput(#[from] PreprocessError),
  #[error("推理引擎调用失败: {0}")]
  EngineInvocation(#[from] EngineError),
  #[error("模型输出长度不匹配: 期望 {expected}, 实际 {actual}")]
  OutputSize { expected: usize, actual: usize },
  #[error("结果解码失败: {0}")]
  Decode(#[from] DecodeError),
}

struct Loaded<E> {
  engine: E,
  shape: ModelShape,
  policy: ChannelPolicy,
}

/// 单图分类器
///
/// `init` 加载一次模型，`classify` 可反复调用，`close` 或析构时释放引擎。
/// 推理需要 `&mut self`，同一实例的并发调用须由调用方加锁。
pub struct Classifier<L: EngineLoader> {
  loader: L,
  loaded: Option<Loaded<L::Engine>>,
}

impl<L: EngineLoader> Classifier<L> {
  pub fn new(loader: L) -> Self {
    Self {
      loader,
      loaded: None,
    }
  }

  pub fn init(&mut self) -> Result<(), InitError> {
    if self.loaded.is_some() {
      warn!("分类器已经初始化, 忽略重复的初始化");
      return Ok(());
    }

    info!("加载模型");
    let engine = self.loader.load().inspect_err(|e| error!("模型加载失败: {}", e))?;
    let shape = ModelShape::resolve(&engine)?;
    let policy = self.loader.channel_policy();
    let channels = policy.channels_for(&shape)?;
    info!(
      "模型输入 {}x{}x{}, 输出类别 {}",
      shape.input_width(),
      shape.input_height(),
      channels,
      shape.output_classes()
    );

    self.loaded = Some(Loaded {
      engine,
      shape,
      policy,
    });
    Ok(())
  }

  pub fn classify(&mut self, image: &DynamicImage) -> Result<ClassificationResult, ClassifyError> {
    let loaded = self.loaded.as_mut().ok_or(ClassifyError::NotInitialized)?;

    let buffer = prepare_with(image, &loaded.shape, loaded.policy)?;
    let scores = run_inference(&mut loaded.engine, &buffer, loaded.shape.output_classes())?;
    let result = decode(&scores)?;
    debug!("分类结果: {:?}", result);

    Ok(result)
  }

  pub fn close(&mut self) {
    if self.loaded.take().is_some() {
      info!("释放推理引擎");
    }
  }

  pub fn is_initialized(&self) -> bool {
    self.loaded.is_some()
  }

  pub fn shape(&self) -> Option<&ModelShape> {
    self.loaded.as_ref().map(|loaded| &loaded.shape)
  }
}

impl<L: EngineLoader> Drop for Classifier<L> {
  fn drop(&mut self) {
    self.close();
  }
}

impl<L: EngineLoader> Model for Classifier<L> {
  type Input = DynamicImage;
  type Output = ClassificationResult;
  type Error = ClassifyError;

  fn infer(&mut self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    self.classify(input)
  }
}

/// 执行一次推理，原样返回模型得分
pub fn run_inference<E: InferenceEngine + ?Sized>(
  engine: &mut E,
  buffer: &InputBuffer,
  output_classes: usize,
) -> Result<Vec<f32>, ClassifyError> {
  debug!("执行模型推理, 输入长度 {}", buffer.len());
  let scores = engine.run(buffer.as_slice()).inspect_err(|e| error!("模型推理失败: {}", e))?;

  if scores.len() != output_classes {
    error!(
      "模型输出长度不匹配: 期望 {}, 实际 {}",
      output_classes,
      scores.len()
    );
    return Err(ClassifyError::OutputSize {
      expected: output_classes,
      actual: scores.len(),
    });
  }

  Ok(scores)
}

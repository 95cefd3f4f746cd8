// 该文件是 Fenlei （分类） 项目的一部分。
// src/engine.rs - 推理引擎抽象
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
use tracing::error;
use url::Url;

use crate::{
  FromUrl,
  asset::{AssetError, AssetStore, DEFAULT_MODEL_NAME},
  preprocess::ChannelPolicy,
  url_file_path,
};

/// 推理引擎：只暴露张量形状查询与同步推理两个能力
///
/// 引擎实例不保证可重入，同一实例的推理调用需由调用方串行化。
pub trait InferenceEngine {
  /// 各输入张量的形状，按模型声明的顺序
  fn input_shapes(&self) -> Vec<Vec<usize>>;
  /// 各输出张量的形状，按模型声明的顺序
  fn output_shapes(&self) -> Vec<Vec<usize>>;
  /// 以第一个输入张量执行推理，返回第一个输出张量的数据
  fn run(&mut self, input: &[f32]) -> Result<Vec<f32>, EngineError>;
}

impl<E: InferenceEngine + ?Sized> InferenceEngine for Box<E> {
  fn input_shapes(&self) -> Vec<Vec<usize>> {
    (**self).input_shapes()
  }

  fn output_shapes(&self) -> Vec<Vec<usize>> {
    (**self).output_shapes()
  }

  fn run(&mut self, input: &[f32]) -> Result<Vec<f32>, EngineError> {
    (**self).run(input)
  }
}

/// 负责加载模型并构建推理引擎
pub trait EngineLoader {
  type Engine: InferenceEngine;

  fn load(&self) -> Result<Self::Engine, EngineError>;

  fn channel_policy(&self) -> ChannelPolicy {
    ChannelPolicy::default()
  }
}

#[derive(Error, Debug)]
pub enum EngineError {
  #[error("模型资源错误: {0}")]
  Asset(#[from] AssetError),
  #[error("模型没有输入张量")]
  NoInput,
  #[error("模型没有输出张量")]
  NoOutput,
  #[error("输入数据长度不匹配: 期望 {expected}, 实际 {actual}")]
  InputSize { expected: usize, actual: usize },
  #[error("推理后端错误: {0}")]
  Backend(String),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("模型参数 {key} 无效: {value}")]
  InvalidOption { key: String, value: String },
}

impl EngineError {
  pub fn backend(e: impl std::fmt::Display) -> Self {
    EngineError::Backend(e.to_string())
  }
}

/// 从模型 URL 中解析出的公共配置
#[derive(Debug, Clone)]
pub struct ModelLocation {
  pub store: AssetStore,
  pub name: String,
  pub channel_policy: ChannelPolicy,
}

impl ModelLocation {
  /// 解析形如 `scheme:///path/to/model?channels=gray` 的 URL
  pub fn parse(url: &Url, scheme: &str) -> Result<Self, EngineError> {
    if url.scheme() != scheme {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        scheme,
        url.scheme()
      );
      return Err(EngineError::SchemeMismatch(format!(
        "模型路径必须使用 {} 方案",
        scheme
      )));
    }

    // 以 `/` 结尾的路径视为资源目录，使用默认模型名称
    let path = url_file_path(url);
    let (store, name) = if path.ends_with('/') {
      (AssetStore::new(path), DEFAULT_MODEL_NAME.to_string())
    } else {
      AssetStore::split(path)?
    };

    let mut channel_policy = ChannelPolicy::default();
    for (k, v) in url.query_pairs() {
      if k == "channels" {
        channel_policy = v.parse().map_err(|_| EngineError::InvalidOption {
          key: k.to_string(),
          value: v.to_string(),
        })?;
      }
    }

    Ok(Self {
      store,
      name,
      channel_policy,
    })
  }
}

/// 统计张量元素个数，空形状视为标量
pub(crate) fn element_count(shape: &[usize]) -> usize {
  shape.iter().product()
}

#[cfg(feature = "onnx")]
mod onnx_backend;
#[cfg(feature = "onnx")]
pub use self::onnx_backend::{OnnxEngine, OnnxEngineBuilder};

#[cfg(feature = "tflite")]
mod tflite_backend;
#[cfg(feature = "tflite")]
pub use self::tflite_backend::{TfliteEngine, TfliteEngineBuilder};

/// 按 URL 方案选择的推理后端
pub enum ModelUrl {
  #[cfg(feature = "onnx")]
  Onnx(OnnxEngineBuilder),
  #[cfg(feature = "tflite")]
  Tflite(TfliteEngineBuilder),
}

impl FromUrl for ModelUrl {
  type Error = EngineError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    #[cfg(feature = "onnx")]
    {
      use crate::FromUrlWithScheme;

      if url.scheme() == OnnxEngineBuilder::SCHEME {
        return Ok(ModelUrl::Onnx(OnnxEngineBuilder::from_url(url)?));
      }
    }
    #[cfg(feature = "tflite")]
    {
      use crate::FromUrlWithScheme;

      if url.scheme() == TfliteEngineBuilder::SCHEME {
        return Ok(ModelUrl::Tflite(TfliteEngineBuilder::from_url(url)?));
      }
    }
    Err(EngineError::SchemeMismatch(format!(
      "不支持的模型方案 '{}'",
      url.scheme()
    )))
  }
}

pub enum AnyEngine {
  #[cfg(feature = "onnx")]
  Onnx(OnnxEngine),
  #[cfg(feature = "tflite")]
  Tflite(TfliteEngine),
}

impl InferenceEngine for AnyEngine {
  fn input_shapes(&self) -> Vec<Vec<usize>> {
    match self {
      #[cfg(feature = "onnx")]
      AnyEngine::Onnx(engine) => engine.input_shapes(),
      #[cfg(feature = "tflite")]
      AnyEngine::Tflite(engine) => engine.input_shapes(),
    }
  }

  fn output_shapes(&self) -> Vec<Vec<usize>> {
    match self {
      #[cfg(feature = "onnx")]
      AnyEngine::Onnx(engine) => engine.output_shapes(),
      #[cfg(feature = "tflite")]
      AnyEngine::Tflite(engine) => engine.output_shapes(),
    }
  }

  fn run(&mut self, input: &[f32]) -> Result<Vec<f32>, EngineError> {
    match self {
      #[cfg(feature = "onnx")]
      AnyEngine::Onnx(engine) => engine.run(input),
      #[cfg(feature = "tflite")]
      AnyEngine::Tflite(engine) => engine.run(input),
    }
  }
}

impl EngineLoader for ModelUrl {
  type Engine = AnyEngine;

  fn load(&self) -> Result<Self::Engine, EngineError> {
    match self {
      #[cfg(feature = "onnx")]
      ModelUrl::Onnx(builder) => builder.load().map(AnyEngine::Onnx),
      #[cfg(feature = "tflite")]
      ModelUrl::Tflite(builder) => builder.load().map(AnyEngine::Tflite),
    }
  }

  fn channel_policy(&self) -> ChannelPolicy {
    match self {
      #[cfg(feature = "onnx")]
      ModelUrl::Onnx(builder) => builder.channel_policy(),
      #[cfg(feature = "tflite")]
      ModelUrl::Tflite(builder) => builder.channel_policy(),
    }
  }
}

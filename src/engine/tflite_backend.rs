// 该文件是 Fenlei （分类） 项目的一部分。
// src/engine/tflite_backend.rs - TensorFlow Lite 推理后端
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

use tflite::{FlatBufferModel, Interpreter, InterpreterBuilder, ops::builtin::BuiltinOpResolver};
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  engine::{EngineError, EngineLoader, InferenceEngine, ModelLocation, element_count},
  preprocess::ChannelPolicy,
};

/// TFLite 解释器
///
/// 模型通过 `build_from_file` 以只读内存映射方式载入，随解释器一同释放。
pub struct TfliteEngine {
  interpreter: Interpreter<'static, BuiltinOpResolver>,
  input_shapes: Vec<Vec<usize>>,
  output_shapes: Vec<Vec<usize>>,
}

pub struct TfliteEngineBuilder {
  location: ModelLocation,
  num_threads: Option<i32>,
}

impl FromUrlWithScheme for TfliteEngineBuilder {
  const SCHEME: &'static str = "tflite";
}

impl FromUrl for TfliteEngineBuilder {
  type Error = EngineError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    let location = ModelLocation::parse(url, Self::SCHEME)?;

    let mut num_threads = None;
    for (k, v) in url.query_pairs() {
      if k == "threads" {
        let threads = v.parse::<i32>().map_err(|_| EngineError::InvalidOption {
          key: k.to_string(),
          value: v.to_string(),
        })?;
        num_threads = Some(threads);
      }
    }

    Ok(TfliteEngineBuilder {
      location,
      num_threads,
    })
  }
}

impl TfliteEngineBuilder {
  pub fn new(location: ModelLocation) -> Self {
    Self {
      location,
      num_threads: None,
    }
  }

  pub fn num_threads(mut self, threads: i32) -> Self {
    self.num_threads = Some(threads);
    self
  }

  pub fn build(&self) -> Result<TfliteEngine, EngineError> {
    let path = self.location.store.resolve(&self.location.name)?;
    info!("加载 TFLite 模型文件: {}", path.display());

    let model = FlatBufferModel::build_from_file(&path).map_err(EngineError::backend)?;

    info!("创建 TFLite 解释器");
    let resolver = BuiltinOpResolver::default();
    let builder = InterpreterBuilder::new(model, resolver).map_err(EngineError::backend)?;
    let mut interpreter = builder.build().map_err(EngineError::backend)?;
    if let Some(threads) = self.num_threads {
      debug!("解释器线程数: {}", threads);
      interpreter.set_num_threads(threads);
    }
    interpreter
      .allocate_tensors()
      .map_err(EngineError::backend)?;
    info!("模型加载完成");

    let shapes_of = |indices: &[i32]| -> Result<Vec<Vec<usize>>, EngineError> {
      indices
        .iter()
        .map(|&index| {
          interpreter
            .tensor_info(index)
            .map(|info| info.dims)
            .ok_or_else(|| {
              error!("无法获取张量 {} 的信息", index);
              EngineError::Backend(format!("张量 {} 不存在", index))
            })
        })
        .collect()
    };
    let input_shapes = shapes_of(interpreter.inputs())?;
    let output_shapes = shapes_of(interpreter.outputs())?;

    debug!("模型输入形状: {:?}", input_shapes);
    debug!("模型输出形状: {:?}", output_shapes);

    Ok(TfliteEngine {
      interpreter,
      input_shapes,
      output_shapes,
    })
  }
}

impl EngineLoader for TfliteEngineBuilder {
  type Engine = TfliteEngine;

  fn load(&self) -> Result<Self::Engine, EngineError> {
    self.build()
  }

  fn channel_policy(&self) -> ChannelPolicy {
    self.location.channel_policy
  }
}

impl InferenceEngine for TfliteEngine {
  fn input_shapes(&self) -> Vec<Vec<usize>> {
    self.input_shapes.clone()
  }

  fn output_shapes(&self) -> Vec<Vec<usize>> {
    self.output_shapes.clone()
  }

  fn run(&mut self, input: &[f32]) -> Result<Vec<f32>, EngineError> {
    let input_index = *self.interpreter.inputs().first().ok_or(EngineError::NoInput)?;
    let output_index = *self.interpreter.outputs().first().ok_or(EngineError::NoOutput)?;

    let expected = self
      .input_shapes
      .first()
      .map(|shape| element_count(shape))
      .ok_or(EngineError::NoInput)?;
    if input.len() != expected {
      return Err(EngineError::InputSize {
        expected,
        actual: input.len(),
      });
    }

    debug!("设置模型输入");
    let tensor: &mut [f32] = self
      .interpreter
      .tensor_data_mut(input_index)
      .map_err(EngineError::backend)?;
    tensor.copy_from_slice(input);

    debug!("执行模型推理");
    self.interpreter.invoke().map_err(EngineError::backend)?;

    debug!("获取模型输出");
    let output: &[f32] = self
      .interpreter
      .tensor_data(output_index)
      .map_err(EngineError::backend)?;

    Ok(output.to_vec())
  }
}

// 该文件是 Fenlei （分类） 项目的一部分。
// src/engine/onnx_backend.rs - 基于 tract 的 ONNX 推理后端
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

use tracing::{debug, info};
use tract_onnx::prelude::*;
use tract_onnx::tract_hir::internal::DimLike;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  engine::{EngineError, EngineLoader, InferenceEngine, ModelLocation, element_count},
  preprocess::ChannelPolicy,
};

pub struct OnnxEngine {
  model: TypedRunnableModel<TypedModel>,
  input_shapes: Vec<Vec<usize>>,
  output_shapes: Vec<Vec<usize>>,
}

pub struct OnnxEngineBuilder {
  location: ModelLocation,
}

impl FromUrlWithScheme for OnnxEngineBuilder {
  const SCHEME: &'static str = "onnx";
}

impl FromUrl for OnnxEngineBuilder {
  type Error = EngineError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    Ok(OnnxEngineBuilder {
      location: ModelLocation::parse(url, Self::SCHEME)?,
    })
  }
}

impl OnnxEngineBuilder {
  pub fn new(location: ModelLocation) -> Self {
    Self { location }
  }

  pub fn build(&self) -> Result<OnnxEngine, EngineError> {
    let path = self.location.store.resolve(&self.location.name)?;
    info!("加载 ONNX 模型文件: {}", path.display());

    let model = tract_onnx::onnx()
      .model_for_path(&path)
      .and_then(|model| model.into_optimized())
      .and_then(|model| model.into_runnable())
      .map_err(EngineError::backend)?;
    info!("模型加载完成");

    let graph = model.model();
    // 动态维度（如批大小）按 1 处理
    let concrete = |fact: &TypedFact| -> Vec<usize> {
      fact.shape.iter().map(|d| d.to_usize().unwrap_or(1)).collect()
    };

    let input_shapes = (0..graph.inputs.len())
      .map(|i| graph.input_fact(i).map(concrete))
      .collect::<TractResult<Vec<_>>>()
      .map_err(EngineError::backend)?;
    let output_shapes = (0..graph.outputs.len())
      .map(|i| graph.output_fact(i).map(concrete))
      .collect::<TractResult<Vec<_>>>()
      .map_err(EngineError::backend)?;

    debug!("模型输入形状: {:?}", input_shapes);
    debug!("模型输出形状: {:?}", output_shapes);

    Ok(OnnxEngine {
      model,
      input_shapes,
      output_shapes,
    })
  }
}

impl EngineLoader for OnnxEngineBuilder {
  type Engine = OnnxEngine;

  fn load(&self) -> Result<Self::Engine, EngineError> {
    self.build()
  }

  fn channel_policy(&self) -> ChannelPolicy {
    self.location.channel_policy
  }
}

impl InferenceEngine for OnnxEngine {
  fn input_shapes(&self) -> Vec<Vec<usize>> {
    self.input_shapes.clone()
  }

  fn output_shapes(&self) -> Vec<Vec<usize>> {
    self.output_shapes.clone()
  }

  fn run(&mut self, input: &[f32]) -> Result<Vec<f32>, EngineError> {
    let shape = self.input_shapes.first().ok_or(EngineError::NoInput)?;
    let expected = element_count(shape);
    if input.len() != expected {
      return Err(EngineError::InputSize {
        expected,
        actual: input.len(),
      });
    }

    let tensor = Tensor::from_shape(shape, input).map_err(EngineError::backend)?;
    debug!("执行模型推理");
    let outputs = self
      .model
      .run(tvec!(tensor.into()))
      .map_err(EngineError::backend)?;
    let output = outputs.first().ok_or(EngineError::NoOutput)?;
    let scores = output
      .as_slice::<f32>()
      .map_err(EngineError::backend)?
      .to_vec();

    Ok(scores)
  }
}

#[cfg(test)]
mod tests {
  use image::{DynamicImage, GrayImage, Luma};
  use prost::Message;
  use tract_onnx::pb::{
    GraphProto, ModelProto, NodeProto, OperatorSetIdProto, TensorShapeProto, TypeProto,
    ValueInfoProto, tensor_proto::DataType, tensor_shape_proto, type_proto,
  };

  use super::*;
  use crate::{asset::AssetError, model::Classifier};

  fn dim_value(value: i64) -> tensor_shape_proto::Dimension {
    tensor_shape_proto::Dimension {
      value: Some(tensor_shape_proto::dimension::Value::DimValue(value)),
      ..Default::default()
    }
  }

  fn dim_param(name: &str) -> tensor_shape_proto::Dimension {
    tensor_shape_proto::Dimension {
      value: Some(tensor_shape_proto::dimension::Value::DimParam(
        name.to_string(),
      )),
      ..Default::default()
    }
  }

  fn float_value(name: &str, dim: Vec<tensor_shape_proto::Dimension>) -> ValueInfoProto {
    ValueInfoProto {
      name: name.to_string(),
      r#type: Some(TypeProto {
        value: Some(type_proto::Value::TensorType(type_proto::Tensor {
          elem_type: DataType::Float as i32,
          shape: Some(TensorShapeProto { dim }),
        })),
        ..Default::default()
      }),
      ..Default::default()
    }
  }

  /// x[N, 2, 2] 经 Flatten 得到 y[N, 4]，批大小为符号维度
  fn write_flatten_model(name: &str) -> std::path::PathBuf {
    let graph = GraphProto {
      name: "flatten".to_string(),
      node: vec![NodeProto {
        input: vec!["x".to_string()],
        output: vec!["y".to_string()],
        op_type: "Flatten".to_string(),
        ..Default::default()
      }],
      input: vec![float_value(
        "x",
        vec![dim_param("N"), dim_value(2), dim_value(2)],
      )],
      output: vec![float_value("y", vec![dim_param("N"), dim_value(4)])],
      ..Default::default()
    };
    let model = ModelProto {
      ir_version: 7,
      opset_import: vec![OperatorSetIdProto {
        domain: String::new(),
        version: 13,
      }],
      graph: Some(graph),
      ..Default::default()
    };

    let dir = std::env::temp_dir().join(format!("fenlei-{}-{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("model.onnx");
    std::fs::write(&path, model.encode_to_vec()).unwrap();
    path
  }

  fn builder_for(path: &std::path::Path) -> OnnxEngineBuilder {
    let url = Url::parse(&format!("onnx://{}", path.display())).unwrap();
    OnnxEngineBuilder::from_url(&url).unwrap()
  }

  #[test]
  fn flatten_model_shapes_and_run() {
    let path = write_flatten_model("onnx-run");
    let mut engine = builder_for(&path).load().unwrap();

    assert_eq!(engine.input_shapes(), vec![vec![1, 2, 2]]);
    assert_eq!(engine.output_shapes(), vec![vec![1, 4]]);

    let scores = engine.run(&[0.1, 0.2, 0.3, 0.4]).unwrap();
    assert_eq!(scores, vec![0.1, 0.2, 0.3, 0.4]);

    assert!(matches!(
      engine.run(&[0.1, 0.2, 0.3]),
      Err(EngineError::InputSize {
        expected: 4,
        actual: 3
      })
    ));

    std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
  }

  #[test]
  fn classify_through_onnx_model() {
    let path = write_flatten_model("onnx-classify");
    let mut classifier = Classifier::new(builder_for(&path));
    classifier.init().unwrap();

    let shape = *classifier.shape().unwrap();
    assert_eq!(
      (shape.input_width(), shape.input_height(), shape.input_channels()),
      (2, 2, 1)
    );
    assert_eq!(shape.output_classes(), 4);

    // 行优先展开后 (0, 1) 处的白色像素位于下标 2
    let mut image = GrayImage::new(2, 2);
    image.put_pixel(0, 1, Luma([255]));
    let result = classifier.classify(&DynamicImage::ImageLuma8(image)).unwrap();
    assert_eq!(result.class_index, 2);
    assert_eq!(result.score, 1.0);

    classifier.close();
    std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
  }

  #[test]
  fn missing_model_file() {
    let url = Url::parse("onnx:///nonexistent/dir/model.onnx").unwrap();
    let builder = OnnxEngineBuilder::from_url(&url).unwrap();
    assert!(matches!(
      builder.load(),
      Err(EngineError::Asset(AssetError::Missing(_)))
    ));
  }

  #[test]
  fn corrupt_model_file() {
    let dir = std::env::temp_dir().join(format!("fenlei-onnx-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("model.onnx"), b"not a valid onnx model").unwrap();

    let url = Url::from_file_path(dir.join("model.onnx")).unwrap();
    let url = Url::parse(&url.as_str().replacen("file:", "onnx:", 1)).unwrap();
    let builder = OnnxEngineBuilder::from_url(&url).unwrap();
    assert!(matches!(builder.load(), Err(EngineError::Backend(_))));

    std::fs::remove_dir_all(&dir).unwrap();
  }
}

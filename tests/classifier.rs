// 该文件是 Fenlei （分类） 项目的一部分。
// tests/classifier.rs - 分类流程测试
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

use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};

use fenlei::{
  engine::{EngineError, EngineLoader, InferenceEngine},
  model::{ClassifyError, Classifier, InitError, ModelShape, ShapeError},
  preprocess::{PreprocessError, prepare},
};

/// 以输入均值为依据给出得分：亮图判为类别 1，暗图判为类别 0
struct BrightnessEngine {
  side: usize,
}

impl InferenceEngine for BrightnessEngine {
  fn input_shapes(&self) -> Vec<Vec<usize>> {
    vec![vec![1, self.side, self.side]]
  }

  fn output_shapes(&self) -> Vec<Vec<usize>> {
    vec![vec![1, 2]]
  }

  fn run(&mut self, input: &[f32]) -> Result<Vec<f32>, EngineError> {
    let expected = self.side * self.side;
    if input.len() != expected {
      return Err(EngineError::InputSize {
        expected,
        actual: input.len(),
      });
    }
    let mean = input.iter().sum::<f32>() / input.len() as f32;
    Ok(vec![1.0 - mean, mean])
  }
}

struct BrightnessLoader {
  side: usize,
}

impl EngineLoader for BrightnessLoader {
  type Engine = BrightnessEngine;

  fn load(&self) -> Result<Self::Engine, EngineError> {
    Ok(BrightnessEngine { side: self.side })
  }
}

struct EmptyLoader;

impl EngineLoader for EmptyLoader {
  type Engine = BrightnessEngine;

  fn load(&self) -> Result<Self::Engine, EngineError> {
    Err(EngineError::NoInput)
  }
}

struct NoOutputEngine;

impl InferenceEngine for NoOutputEngine {
  fn input_shapes(&self) -> Vec<Vec<usize>> {
    vec![vec![1, 28, 28]]
  }

  fn output_shapes(&self) -> Vec<Vec<usize>> {
    Vec::new()
  }

  fn run(&mut self, _input: &[f32]) -> Result<Vec<f32>, EngineError> {
    Err(EngineError::NoOutput)
  }
}

struct NoOutputLoader;

impl EngineLoader for NoOutputLoader {
  type Engine = Box<dyn InferenceEngine>;

  fn load(&self) -> Result<Self::Engine, EngineError> {
    Ok(Box::new(NoOutputEngine))
  }
}

fn solid(width: u32, height: u32, value: u8) -> DynamicImage {
  DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([value; 3])))
}

#[test]
fn classifies_bright_and_dark_images() {
  let mut classifier = Classifier::new(BrightnessLoader { side: 28 });
  classifier.init().unwrap();

  let bright = classifier.classify(&solid(300, 200, 255)).unwrap();
  assert_eq!(bright.class_index, 1);
  assert_eq!(bright.score, 1.0);

  let dark = classifier.classify(&solid(17, 9, 0)).unwrap();
  assert_eq!(dark.class_index, 0);
  assert_eq!(dark.score, 1.0);

  classifier.close();
}

#[test]
fn rgba_input_is_accepted() {
  let mut classifier = Classifier::new(BrightnessLoader { side: 4 });
  classifier.init().unwrap();
  let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([255, 255, 255, 0])));
  assert_eq!(classifier.classify(&image).unwrap().class_index, 1);
}

#[test]
fn color_channels_are_averaged() {
  let mut classifier = Classifier::new(BrightnessLoader { side: 1 });
  classifier.init().unwrap();
  let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(1, 1, Rgb([255, 0, 0])));
  let result = classifier.classify(&image).unwrap();
  // (255 + 0 + 0) / 3 / 255 = 1/3
  assert_eq!(result.class_index, 0);
}

#[test]
fn classify_requires_init() {
  let mut classifier = Classifier::new(BrightnessLoader { side: 28 });
  assert!(!classifier.is_initialized());
  assert!(matches!(
    classifier.classify(&solid(28, 28, 0)),
    Err(ClassifyError::NotInitialized)
  ));
}

#[test]
fn close_twice_and_without_init() {
  let mut never_opened = Classifier::new(BrightnessLoader { side: 28 });
  never_opened.close();
  never_opened.close();

  let mut classifier = Classifier::new(BrightnessLoader { side: 28 });
  classifier.init().unwrap();
  classifier.close();
  classifier.close();
  assert!(classifier.shape().is_none());
}

#[test]
fn zero_sized_images_are_invalid_input() {
  let mut classifier = Classifier::new(BrightnessLoader { side: 28 });
  classifier.init().unwrap();
  for (w, h) in [(0, 28), (28, 0)] {
    let image = DynamicImage::ImageRgb8(RgbImage::new(w, h));
    assert!(matches!(
      classifier.classify(&image),
      Err(ClassifyError::InvalidInput(PreprocessError::EmptyImage { .. }))
    ));
  }
}

#[test]
fn load_failure_is_an_init_error() {
  let mut classifier = Classifier::new(EmptyLoader);
  assert!(matches!(
    classifier.init(),
    Err(InitError::Load(EngineError::NoInput))
  ));
  assert!(!classifier.is_initialized());
}

#[test]
fn model_without_outputs_fails_init() {
  let mut classifier = Classifier::new(NoOutputLoader);
  assert!(matches!(
    classifier.init(),
    Err(InitError::Shape(ShapeError::NoOutput))
  ));
}

#[test]
fn prepare_matches_model_shape() {
  let shape = ModelShape::new(5, 7, 1, 3).unwrap();
  let buffer = prepare(&solid(64, 64, 128), &shape).unwrap();
  assert_eq!(buffer.len(), 35);
  assert!(buffer.as_slice().iter().all(|&v| v == 128.0 / 255.0));
}

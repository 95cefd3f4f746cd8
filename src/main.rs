// 该文件是 Fenlei （分类） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use fenlei::{
  FromUrl,
  engine::ModelUrl,
  input::ImageFileInput,
  label::Labels,
  model::Classifier,
  output::OutputWrapper,
  task::{OneShotTask, Task},
};

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  info!("模型路径: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let input = ImageFileInput::from_url(&args.input)?;

  let mut classifier = Classifier::new(ModelUrl::from_url(&args.model)?);
  classifier.init()?;

  let labels = args.labels.as_deref().map(Labels::from_file).transpose()?;
  if let (Some(labels), Some(shape)) = (labels.as_ref(), classifier.shape())
    && labels.len() != shape.output_classes()
  {
    warn!(
      "标签数量 {} 与模型类别数 {} 不一致",
      labels.len(),
      shape.output_classes()
    );
  }
  let output = OutputWrapper::from_url(&args.output)?.with_labels(labels);

  OneShotTask.run_task(input, classifier, output)
}

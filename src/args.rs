// 该文件是 Fenlei （分类） 项目的一部分。
// src/args.rs - 项目参数配置
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

use std::path::PathBuf;

use clap::Parser;
use url::Url;

/// Fenlei 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 模型路径
  /// 支持格式:
  /// - ONNX: onnx:///path/to/model.onnx
  /// - TFLite: tflite:///path/to/keras_model.tflite
  /// 可附加 ?channels=gray|model 选择输入通道编码
  #[arg(long, value_name = "MODEL")]
  pub model: Url,

  /// 输入图像，例如 image:///path/to/picture.png
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,

  /// 结果输出
  /// - 日志: log://
  /// - JSON 文件: json:///path/to/result.json
  #[arg(long, default_value = "log://", value_name = "OUTPUT")]
  pub output: Url,

  /// 类别标签文件，每行一个类别名称
  #[arg(long, value_name = "FILE")]
  pub labels: Option<PathBuf>,
}

// 该文件是 Jihe（几何）项目的一部分。
// src/bin/shapes_oneshot.rs - 形状检测（几何+置信度）
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

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use url::Url;

use jihe::{
  FromUrl,
  detector::{DetectResult, DetectedShape, ShapeDetector},
  input::ImageFileInput,
  output::{OutputError, OutputWrapper, RecordFileOutput, Render},
  task::{OneShotTask, Task},
  vision::ImageprocVision,
};

/// 形状检测参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 输入图像，如 image:///path/in.png
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出，image:///path/out.png[?font=...] 或 record:///path/out.json?format=json
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,
  /// 额外的结果记录
  #[arg(long, value_name = "RECORD")]
  pub record: Option<Url>,
  /// 等待视觉库就绪的最长时间（毫秒）
  #[arg(long, value_name = "MS", default_value_t = 10_000)]
  pub ready_timeout_ms: u64,
}

/// 同时写入主输出与可选的记录
struct WithRecord {
  output: OutputWrapper,
  record: Option<RecordFileOutput>,
}

impl Render<image::RgbImage, DetectResult<DetectedShape>> for WithRecord {
  type Error = OutputError;

  fn render_result(
    &self,
    frame: &image::RgbImage,
    result: &DetectResult<DetectedShape>,
  ) -> Result<(), Self::Error> {
    self.output.render_result(frame, result)?;
    if let Some(record) = &self.record {
      record.render_result(frame, result)?;
    }
    for shape in result.sorted_by_confidence() {
      info!(
        "{}: {} 角数 {} 面积 {:.1} 中心 ({}, {}) 置信度 {:.2}",
        shape.id,
        shape.name,
        shape.corners,
        shape.area,
        shape.center.x,
        shape.center.y,
        shape.confidence
      );
    }
    Ok(())
  }
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let input = ImageFileInput::from_url(&args.input)?;
  let output = WithRecord {
    output: OutputWrapper::from_url(&args.output)?,
    record: args
      .record
      .as_ref()
      .map(RecordFileOutput::from_url)
      .transpose()?,
  };
  let detector = ShapeDetector::new(ImageprocVision::new());

  OneShotTask::default()
    .with_ready_timeout(Duration::from_millis(args.ready_timeout_ms))
    .run_task(input, detector, output)
}

// 该文件是 Jihe（几何）项目的一部分。
// src/detector/color_detector.rs - 形状+颜色检测
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

use image::RgbImage;
use tracing::{debug, info};

use crate::{
  classify::{COLOR_RULES, ShapeClassifier, ShapeName, name_for_color},
  detector::{DetectError, DetectResult, Detector, ShapeColor},
  pipeline::{self, PipelineConfig, THRESHOLD_PIPELINE},
  vision::Vision,
};

/// 阈值流水线上的形状+颜色检测器，未识别的形状不输出
pub struct ShapeColorDetector<V> {
  vision: V,
  config: PipelineConfig,
  classifier: ShapeClassifier,
}

impl<V: Vision> ShapeColorDetector<V> {
  pub fn new(vision: V) -> Self {
    Self::with_config(vision, THRESHOLD_PIPELINE, ShapeClassifier::new(COLOR_RULES))
  }

  pub fn with_config(vision: V, config: PipelineConfig, classifier: ShapeClassifier) -> Self {
    Self {
      vision,
      config,
      classifier,
    }
  }
}

impl<V: Vision> Detector for ShapeColorDetector<V> {
  type Input = RgbImage;
  type Output = DetectResult<ShapeColor>;
  type Error = DetectError;

  fn is_ready(&self) -> bool {
    self.vision.is_ready()
  }

  fn wait_ready(&self, timeout: Duration) -> bool {
    self.vision.readiness().wait_timeout(timeout)
  }

  fn detect(&self, image: &RgbImage) -> Result<Self::Output, Self::Error> {
    if !self.is_ready() {
      return Err(DetectError::NotReady);
    }

    let (width, height) = image.dimensions();
    let candidates = pipeline::extract_candidates(&self.vision, image, &self.config)?;

    let mut items = Vec::with_capacity(candidates.len());
    for candidate in candidates {
      let class = self
        .classifier
        .classify(&candidate.polygon, &candidate.contour.points, candidate.convex);
      if class.name == ShapeName::Unknown {
        debug!("轮廓 {} 形状未识别，跳过", candidate.index);
        continue;
      }

      let mask = self.vision.fill_mask(width, height, &candidate.contour.points)?;
      let [r, g, b] = self.vision.mean_in_mask(image, &mask)?;
      let color = name_for_color(r, g, b);
      debug!(
        "轮廓 {}: {} 均值 ({:.1}, {:.1}, {:.1}) -> {}",
        candidate.index, class.name, r, g, b, color
      );

      items.push(ShapeColor {
        shape: class.name.as_lowercase(),
        color,
      });
    }

    info!("检测到 {} 个带颜色的形状", items.len());
    Ok(items.into())
  }
}

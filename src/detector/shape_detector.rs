// 该文件是 Jihe（几何）项目的一部分。
// src/detector/shape_detector.rs - 形状检测（几何+置信度）
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
use tracing::info;

use crate::{
  classify::{GEOMETRY_RULES, ShapeClassifier},
  detector::{Center, DetectError, DetectResult, DetectedShape, Detector},
  pipeline::{self, EDGE_PIPELINE, PipelineConfig},
  vision::Vision,
};

/// 边缘流水线上的形状检测器
pub struct ShapeDetector<V> {
  vision: V,
  config: PipelineConfig,
  classifier: ShapeClassifier,
}

impl<V: Vision> ShapeDetector<V> {
  pub fn new(vision: V) -> Self {
    Self::with_config(vision, EDGE_PIPELINE, ShapeClassifier::new(GEOMETRY_RULES))
  }

  pub fn with_config(vision: V, config: PipelineConfig, classifier: ShapeClassifier) -> Self {
    Self {
      vision,
      config,
      classifier,
    }
  }

  pub fn vision(&self) -> &V {
    &self.vision
  }
}

impl<V: Vision> Detector for ShapeDetector<V> {
  type Input = RgbImage;
  type Output = DetectResult<DetectedShape>;
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

    let candidates = pipeline::extract_candidates(&self.vision, image, &self.config)?;
    let items: Vec<DetectedShape> = candidates
      .into_iter()
      .map(|candidate| {
        let class = self
          .classifier
          .classify(&candidate.polygon, &candidate.contour.points, candidate.convex);
        let (x, y) = self.vision.centroid(&candidate.contour.points);
        DetectedShape {
          id: format!("shape-{}", candidate.index),
          name: class.name,
          corners: class.corners,
          area: candidate.area,
          center: Center { x, y },
          confidence: class.confidence,
          contour: candidate.contour.points,
        }
      })
      .collect();

    info!("检测到 {} 个形状", items.len());
    Ok(items.into())
  }
}

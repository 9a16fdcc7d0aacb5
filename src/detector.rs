// 该文件是 Jihe（几何）项目的一部分。
// src/detector.rs - 检测器
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

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{classify::ShapeName, geometry::Vertex, vision::VisionError};

pub trait Detector {
  type Input;
  type Output;
  type Error;

  fn is_ready(&self) -> bool;
  /// 阻塞等待视觉库就绪，超时返回 false
  fn wait_ready(&self, timeout: Duration) -> bool;
  fn detect(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

#[derive(Error, Debug, PartialEq)]
pub enum DetectError {
  #[error("视觉库尚未就绪")]
  NotReady,
  #[error("图像处理失败: {0}")]
  Vision(#[from] VisionError),
}

impl DetectError {
  /// 面向用户的提示信息
  pub fn user_message(&self) -> &'static str {
    match self {
      DetectError::NotReady => "视觉库仍在加载，请稍后再试。",
      DetectError::Vision(_) => "图像处理失败，请重新选择图像后再试。",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Center {
  pub x: i32,
  pub y: i32,
}

/// 形状检测结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedShape {
  pub id: String,
  pub name: ShapeName,
  pub corners: usize,
  pub area: f64,
  pub center: Center,
  pub confidence: f64,
  /// 原始轮廓，仅用于绘制
  #[serde(skip)]
  pub contour: Vec<Vertex>,
}

/// 形状+颜色检测结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShapeColor {
  /// 小写形状名
  pub shape: String,
  pub color: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetectResult<T> {
  pub items: Box<[T]>,
}

impl<T> DetectResult<T> {
  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }
}

impl<T> From<Vec<T>> for DetectResult<T> {
  fn from(items: Vec<T>) -> Self {
    DetectResult {
      items: items.into_boxed_slice(),
    }
  }
}

impl DetectResult<DetectedShape> {
  /// 按置信度从高到低排列的视图，结果本身不变
  pub fn sorted_by_confidence(&self) -> Vec<&DetectedShape> {
    let mut view: Vec<&DetectedShape> = self.items.iter().collect();
    view.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    view
  }
}

mod color_detector;
mod shape_detector;
pub use self::color_detector::ShapeColorDetector;
pub use self::shape_detector::ShapeDetector;

#[cfg(test)]
mod tests {
  use super::*;

  fn shape(id: usize, confidence: f64) -> DetectedShape {
    DetectedShape {
      id: format!("shape-{id}"),
      name: ShapeName::Triangle,
      corners: 3,
      area: 100.0,
      center: Center { x: 0, y: 0 },
      confidence,
      contour: Vec::new(),
    }
  }

  #[test]
  fn sorted_view_is_descending() {
    let result = DetectResult::from(vec![shape(0, 0.3), shape(1, 0.9), shape(2, 0.6)]);
    let ids: Vec<&str> = result
      .sorted_by_confidence()
      .iter()
      .map(|s| s.id.as_str())
      .collect();
    assert_eq!(ids, ["shape-1", "shape-2", "shape-0"]);
    // 原顺序不受影响
    assert_eq!(result.items[0].id, "shape-0");
  }

  #[test]
  fn user_messages_are_distinct() {
    assert_ne!(
      DetectError::NotReady.user_message(),
      DetectError::from(VisionError::EmptyImage(0, 0)).user_message()
    );
  }

  #[test]
  fn shape_serializes_without_contour() {
    let mut item = shape(7, 1.0);
    item.contour = vec![Vertex::new(1, 2)];
    let json = serde_json::to_value(&item).unwrap();
    assert_eq!(json["id"], "shape-7");
    assert_eq!(json["name"], "Triangle");
    assert!(json.get("contour").is_none());
  }
}

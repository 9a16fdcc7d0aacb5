// 该文件是 Jihe（几何）项目的一部分。
// src/pipeline.rs - 轮廓提取流水线
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

use image::{GrayImage, RgbImage};
use tracing::debug;

use crate::{
  geometry::Vertex,
  vision::{Contour, Retrieval, Vision, VisionError},
};

/// 二值图生成方式
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeStage {
  /// 梯度边缘，双阈值
  Canny { low: f32, high: f32 },
  /// 固定阈值二值化
  Threshold { level: u8 },
}

/// 流水线参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
  pub name: &'static str,
  pub blur_kernel: u32,
  pub edge: EdgeStage,
  pub retrieval: Retrieval,
  /// 多边形近似容差与周长之比
  pub epsilon_coefficient: f64,
  /// 面积低于该值的轮廓视为噪声
  pub min_area: f64,
}

/// 形状检测（几何+置信度）
pub const EDGE_PIPELINE: PipelineConfig = PipelineConfig {
  name: "edge",
  blur_kernel: 5,
  edge: EdgeStage::Canny {
    low: 75.0,
    high: 175.0,
  },
  retrieval: Retrieval::External,
  epsilon_coefficient: 0.02,
  min_area: 100.0,
};

/// 形状+颜色检测
pub const THRESHOLD_PIPELINE: PipelineConfig = PipelineConfig {
  name: "threshold",
  blur_kernel: 5,
  edge: EdgeStage::Threshold { level: 120 },
  retrieval: Retrieval::TwoLevel,
  epsilon_coefficient: 0.04,
  min_area: 100.0,
};

/// 通过面积过滤的轮廓及其近似多边形
#[derive(Debug, Clone)]
pub struct Candidate {
  /// 轮廓在检索结果中的下标
  pub index: usize,
  pub contour: Contour,
  pub polygon: Vec<Vertex>,
  pub area: f64,
  pub perimeter: f64,
  /// 近似多边形是否为凸
  pub convex: bool,
}

fn binarize<V: Vision>(
  vision: &V,
  image: &RgbImage,
  config: &PipelineConfig,
) -> Result<GrayImage, VisionError> {
  let gray = vision.to_gray(image)?;
  let blurred = vision.blur(&gray, config.blur_kernel)?;
  match config.edge {
    EdgeStage::Canny { low, high } => vision.canny(&blurred, low, high),
    EdgeStage::Threshold { level } => vision.threshold(&blurred, level),
  }
}

/// 对一幅图像执行一次完整的轮廓提取
///
/// 中间缓冲（灰度、模糊、二值图、轮廓列表）都在本函数内拥有，
/// 无论成功还是出错都会在返回时释放。
pub fn extract_candidates<V: Vision>(
  vision: &V,
  image: &RgbImage,
  config: &PipelineConfig,
) -> Result<Vec<Candidate>, VisionError> {
  let binary = binarize(vision, image, config)?;
  let contours = vision.find_contours(&binary, config.retrieval);
  debug!("[{}] 检索到 {} 条轮廓", config.name, contours.len());

  let mut candidates = Vec::new();
  for (index, contour) in contours.into_iter().enumerate() {
    let area = vision.contour_area(&contour.points);
    if area < config.min_area {
      debug!("[{}] 轮廓 {} 面积 {:.1} 过小，跳过", config.name, index, area);
      continue;
    }

    let perimeter = vision.arc_length(&contour.points);
    let polygon = vision.approx_poly(&contour.points, config.epsilon_coefficient * perimeter);
    let convex = vision.is_convex(&polygon);
    debug!(
      "[{}] 轮廓 {}: 面积 {:.1}, 周长 {:.1}, 顶点 {}, 凸 {}",
      config.name,
      index,
      area,
      perimeter,
      polygon.len(),
      convex
    );

    candidates.push(Candidate {
      index,
      contour,
      polygon,
      area,
      perimeter,
      convex,
    });
  }

  Ok(candidates)
}

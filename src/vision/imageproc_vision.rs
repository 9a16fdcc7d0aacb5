// 该文件是 Jihe（几何）项目的一部分。
// src/vision/imageproc_vision.rs - 基于 imageproc 的视觉后端
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

use image::{GrayImage, Luma, RgbImage};
use imageproc::{
  contours::{self, BorderType},
  contrast::{self, ThresholdType},
  drawing::draw_polygon_mut,
  edges, filter,
};
use tracing::debug;

use crate::{
  geometry::{self, Vertex},
  vision::{Contour, Readiness, Retrieval, Vision, VisionError},
};

/// 纯 Rust 视觉后端，构造即完成初始化
#[derive(Debug, Clone)]
pub struct ImageprocVision {
  readiness: Readiness,
}

impl Default for ImageprocVision {
  fn default() -> Self {
    Self::new()
  }
}

impl ImageprocVision {
  pub fn new() -> Self {
    Self {
      readiness: Readiness::ready(),
    }
  }

  /// 由外部决定何时就绪
  pub fn with_readiness(readiness: Readiness) -> Self {
    Self { readiness }
  }
}

/// OpenCV 在 sigma 为 0 时由核尺寸推导的标准差
fn kernel_sigma(kernel: u32) -> f32 {
  0.3 * ((kernel as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// 长度为 `kernel` 的归一化一维高斯核
fn gaussian_kernel(kernel: u32) -> Vec<f32> {
  let sigma = kernel_sigma(kernel);
  let radius = (kernel / 2) as i32;
  let weights: Vec<f32> = (-radius..=radius)
    .map(|i| (-((i * i) as f32) / (2.0 * sigma * sigma)).exp())
    .collect();
  let sum: f32 = weights.iter().sum();
  weights.into_iter().map(|w| w / sum).collect()
}

fn ensure_not_empty(width: u32, height: u32) -> Result<(), VisionError> {
  if width == 0 || height == 0 {
    return Err(VisionError::EmptyImage(width, height));
  }
  Ok(())
}

impl Vision for ImageprocVision {
  fn readiness(&self) -> &Readiness {
    &self.readiness
  }

  fn to_gray(&self, image: &RgbImage) -> Result<GrayImage, VisionError> {
    ensure_not_empty(image.width(), image.height())?;
    Ok(image::imageops::grayscale(image))
  }

  fn blur(&self, gray: &GrayImage, kernel: u32) -> Result<GrayImage, VisionError> {
    ensure_not_empty(gray.width(), gray.height())?;
    if kernel == 0 || kernel % 2 == 0 {
      return Err(VisionError::InvalidKernel(kernel));
    }
    Ok(filter::separable_filter_equal(gray, &gaussian_kernel(kernel)))
  }

  fn canny(&self, gray: &GrayImage, low: f32, high: f32) -> Result<GrayImage, VisionError> {
    ensure_not_empty(gray.width(), gray.height())?;
    Ok(edges::canny(gray, low, high))
  }

  fn threshold(&self, gray: &GrayImage, level: u8) -> Result<GrayImage, VisionError> {
    ensure_not_empty(gray.width(), gray.height())?;
    Ok(contrast::threshold(gray, level, ThresholdType::Binary))
  }

  fn find_contours(&self, binary: &GrayImage, retrieval: Retrieval) -> Vec<Contour> {
    let all = contours::find_contours::<i32>(binary);
    debug!("边界跟踪得到 {} 条轮廓", all.len());

    match retrieval {
      Retrieval::External => all
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| Contour {
          points: c.points,
          parent: None,
          hole: false,
        })
        .collect(),
      // 全部保留，压成两层：外边界没有父轮廓，孔洞指向包围它的外边界
      Retrieval::TwoLevel => all
        .into_iter()
        .map(|c| {
          let hole = c.border_type == BorderType::Hole;
          Contour {
            parent: if hole { c.parent } else { None },
            hole,
            points: c.points,
          }
        })
        .collect(),
    }
  }

  fn approx_poly(&self, contour: &[Vertex], epsilon: f64) -> Vec<Vertex> {
    geometry::approximate_closed(contour, epsilon)
  }

  fn fill_mask(&self, width: u32, height: u32, contour: &[Vertex]) -> Result<GrayImage, VisionError> {
    ensure_not_empty(width, height)?;
    let mut mask = GrayImage::new(width, height);
    let polygon = geometry::dedup_closed(contour);

    if polygon.len() >= 3 {
      draw_polygon_mut(&mut mask, &polygon, Luma([255u8]));
    }
    // 边界像素同样属于区域
    for p in &polygon {
      if p.x >= 0 && p.y >= 0 && (p.x as u32) < width && (p.y as u32) < height {
        mask.put_pixel(p.x as u32, p.y as u32, Luma([255u8]));
      }
    }
    Ok(mask)
  }

  fn mean_in_mask(&self, image: &RgbImage, mask: &GrayImage) -> Result<[f64; 3], VisionError> {
    if image.dimensions() != mask.dimensions() {
      return Err(VisionError::MaskSizeMismatch {
        image: image.dimensions(),
        mask: mask.dimensions(),
      });
    }

    let mut sum = [0u64; 3];
    let mut count = 0u64;
    for (pixel, m) in image.pixels().zip(mask.pixels()) {
      if m[0] == 0 {
        continue;
      }
      for c in 0..3 {
        sum[c] += pixel[c] as u64;
      }
      count += 1;
    }

    if count == 0 {
      return Err(VisionError::EmptyMask);
    }
    let n = count as f64;
    Ok([sum[0] as f64 / n, sum[1] as f64 / n, sum[2] as f64 / n])
  }
}

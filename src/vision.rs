// 该文件是 Jihe（几何）项目的一部分。
// src/vision.rs - 视觉库门面
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

use std::{
  sync::{Arc, Condvar, Mutex},
  time::{Duration, Instant},
};

use image::{GrayImage, RgbImage};
use thiserror::Error;

use crate::geometry::{self, BoundingRect, Moments, RotatedRect, Vertex};

mod imageproc_vision;
pub use self::imageproc_vision::ImageprocVision;

#[derive(Error, Debug, PartialEq)]
pub enum VisionError {
  #[error("图像尺寸为空: {0}x{1}")]
  EmptyImage(u32, u32),
  #[error("掩码尺寸 {mask:?} 与图像尺寸 {image:?} 不一致")]
  MaskSizeMismatch { image: (u32, u32), mask: (u32, u32) },
  #[error("掩码内没有像素")]
  EmptyMask,
  #[error("模糊核尺寸必须为正奇数: {0}")]
  InvalidKernel(u32),
}

/// 轮廓检索方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retrieval {
  /// 仅保留最外层边界
  External,
  /// 保留外边界及其直接子轮廓（孔洞）
  TwoLevel,
}

/// 一条闭合边界及其层级关系
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
  pub points: Vec<Vertex>,
  /// 父轮廓在检索结果中的下标
  pub parent: Option<usize>,
  /// 是否为孔洞边界
  pub hole: bool,
}

/// 视觉库就绪信号
///
/// 由初始化方调用 `mark_ready`，使用方阻塞等待，不做轮询。
#[derive(Debug, Clone, Default)]
pub struct Readiness {
  inner: Arc<(Mutex<bool>, Condvar)>,
}

impl Readiness {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn ready() -> Self {
    let readiness = Self::new();
    readiness.mark_ready();
    readiness
  }

  pub fn mark_ready(&self) {
    let (lock, cvar) = &*self.inner;
    let mut ready = lock.lock().unwrap_or_else(|e| e.into_inner());
    *ready = true;
    cvar.notify_all();
  }

  pub fn is_ready(&self) -> bool {
    let (lock, _) = &*self.inner;
    *lock.lock().unwrap_or_else(|e| e.into_inner())
  }

  /// 等待就绪，超时返回 false
  pub fn wait_timeout(&self, timeout: Duration) -> bool {
    let (lock, cvar) = &*self.inner;
    let deadline = Instant::now() + timeout;
    let mut ready = lock.lock().unwrap_or_else(|e| e.into_inner());
    while !*ready {
      let now = Instant::now();
      if now >= deadline {
        return false;
      }
      let (guard, _) = cvar
        .wait_timeout(ready, deadline - now)
        .unwrap_or_else(|e| e.into_inner());
      ready = guard;
    }
    true
  }
}

/// 视觉库门面
///
/// 图像级操作由具体后端实现；几何度量默认委托给 [`geometry`]。
pub trait Vision {
  fn readiness(&self) -> &Readiness;

  fn is_ready(&self) -> bool {
    self.readiness().is_ready()
  }

  /// RGB 转灰度
  fn to_gray(&self, image: &RgbImage) -> Result<GrayImage, VisionError>;
  /// 以 `kernel`×`kernel` 高斯核降噪
  fn blur(&self, gray: &GrayImage, kernel: u32) -> Result<GrayImage, VisionError>;
  /// 梯度边缘图
  fn canny(&self, gray: &GrayImage, low: f32, high: f32) -> Result<GrayImage, VisionError>;
  /// 二值化，大于 `level` 的像素置为 255
  fn threshold(&self, gray: &GrayImage, level: u8) -> Result<GrayImage, VisionError>;
  fn find_contours(&self, binary: &GrayImage, retrieval: Retrieval) -> Vec<Contour>;
  /// 多边形近似，容差为 `epsilon` 像素
  fn approx_poly(&self, contour: &[Vertex], epsilon: f64) -> Vec<Vertex>;
  /// 以填充的轮廓生成掩码
  fn fill_mask(&self, width: u32, height: u32, contour: &[Vertex]) -> Result<GrayImage, VisionError>;
  /// 掩码内的 RGB 均值
  fn mean_in_mask(&self, image: &RgbImage, mask: &GrayImage) -> Result<[f64; 3], VisionError>;

  fn contour_area(&self, contour: &[Vertex]) -> f64 {
    geometry::contour_area(contour)
  }

  fn arc_length(&self, contour: &[Vertex]) -> f64 {
    geometry::arc_length(contour)
  }

  fn moments(&self, contour: &[Vertex]) -> Moments {
    geometry::moments(contour)
  }

  /// 取整后的质心
  fn centroid(&self, contour: &[Vertex]) -> (i32, i32) {
    geometry::centroid(contour)
  }

  fn bounding_rect(&self, points: &[Vertex]) -> BoundingRect {
    geometry::bounding_rect(points)
  }

  fn min_area_rect(&self, points: &[Vertex]) -> RotatedRect {
    geometry::min_area_rect(points)
  }

  fn is_convex(&self, polygon: &[Vertex]) -> bool {
    geometry::is_convex(polygon)
  }
}

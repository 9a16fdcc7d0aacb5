// 该文件是 Jihe（几何）项目的一部分。
// src/output/draw.rs - 形状检测结果可视化
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

use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_line_segment_mut, draw_text_mut};
use rand::Rng;
use thiserror::Error;

use crate::{
  detector::{DetectResult, DetectedShape},
  geometry::Vertex,
};

// 文本渲染常量
const LABEL_FONT_SIZE: f32 = 16.0;
const LABEL_OFFSET_X: i32 = 40; // 标签相对质心左移

// 2 像素线宽：原线段加上向右、向下各平移一像素的副本
const OUTLINE_OFFSETS: [(f32, f32); 3] = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)];

#[derive(Error, Debug)]
pub enum DrawError {
  #[error("字体文件读取错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("字体解析错误: {0}")]
  FontError(#[from] ab_glyph::InvalidFont),
}

/// 轮廓描边与标签绘制
///
/// 未配置字体时只描边，不绘制标签。
pub struct Draw {
  font_size: f32,
  font: Option<FontVec>,
}

impl Default for Draw {
  fn default() -> Self {
    Self {
      font_size: LABEL_FONT_SIZE,
      font: None,
    }
  }
}

/// 标签文本，如 `Square (97%)`
pub fn label_for(shape: &DetectedShape) -> String {
  format!("{} ({}%)", shape.name, (shape.confidence * 100.0).round() as i64)
}

fn random_color() -> Rgb<u8> {
  let mut rng = rand::rng();
  Rgb([rng.random(), rng.random(), rng.random()])
}

impl Draw {
  pub fn with_font_file<P: AsRef<Path>>(path: P) -> Result<Self, DrawError> {
    let data = std::fs::read(path)?;
    let font = FontVec::try_from_vec(data)?;
    Ok(Self {
      font: Some(font),
      ..Self::default()
    })
  }

  pub fn has_font(&self) -> bool {
    self.font.is_some()
  }

  fn draw_outline(&self, image: &mut RgbImage, contour: &[Vertex], color: Rgb<u8>) {
    let n = contour.len();
    if n < 2 {
      return;
    }
    for i in 0..n {
      let (p, q) = (contour[i], contour[(i + 1) % n]);
      for (dx, dy) in OUTLINE_OFFSETS {
        draw_line_segment_mut(
          image,
          (p.x as f32 + dx, p.y as f32 + dy),
          (q.x as f32 + dx, q.y as f32 + dy),
          color,
        );
      }
    }
  }

  fn draw_shape(&self, image: &mut RgbImage, shape: &DetectedShape) {
    let color = random_color();
    self.draw_outline(image, &shape.contour, color);

    if let Some(font) = &self.font {
      draw_text_mut(
        image,
        color,
        shape.center.x - LABEL_OFFSET_X,
        shape.center.y,
        PxScale::from(self.font_size),
        font,
        &label_for(shape),
      );
    }
  }

  /// 在图像副本上绘制全部形状
  pub fn draw_detection(&self, image: &RgbImage, result: &DetectResult<DetectedShape>) -> RgbImage {
    let mut canvas = image.clone();
    self.draw_detections_on_image(&mut canvas, result);
    canvas
  }

  pub fn draw_detections_on_image(&self, image: &mut RgbImage, result: &DetectResult<DetectedShape>) {
    for shape in result.items.iter() {
      self.draw_shape(image, shape);
    }
  }
}

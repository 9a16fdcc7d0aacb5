// 该文件是 Jihe（几何）项目的一部分。
// src/classify/color.rs - 颜色命名
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

/// 调色板条目
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedColor {
  pub name: &'static str,
  pub rgb: [u8; 3],
}

const fn named(name: &'static str, r: u8, g: u8, b: u8) -> NamedColor {
  NamedColor { name, rgb: [r, g, b] }
}

/// 固定调色板，顺序即平局时的优先顺序
pub const PALETTE: [NamedColor; 12] = [
  named("red", 255, 0, 0),
  named("green", 0, 128, 0),
  named("blue", 0, 0, 255),
  named("yellow", 255, 255, 0),
  named("orange", 255, 165, 0),
  named("purple", 128, 0, 128),
  named("pink", 255, 192, 203),
  named("brown", 165, 42, 42),
  named("black", 0, 0, 0),
  named("white", 255, 255, 255),
  named("gray", 128, 128, 128),
  named("cyan", 0, 255, 255),
];

// 三个通道同时超过/低于该值时直接判定，不参与最近邻搜索
const WHITE_FLOOR: f64 = 240.0;
const BLACK_CEIL: f64 = 30.0;

/// RGB 空间平方欧氏距离
fn distance_sq(rgb: [f64; 3], color: &NamedColor) -> f64 {
  rgb
    .iter()
    .zip(color.rgb.iter())
    .map(|(a, b)| {
      let d = a - *b as f64;
      d * d
    })
    .sum()
}

/// 将 RGB 均值映射到最接近的调色板颜色名
///
/// 通道取值范围为 [0, 255]，允许小数（掩码内的均值）。
pub fn name_for_color(r: f64, g: f64, b: f64) -> &'static str {
  if r > WHITE_FLOOR && g > WHITE_FLOOR && b > WHITE_FLOOR {
    return "white";
  }
  if r < BLACK_CEIL && g < BLACK_CEIL && b < BLACK_CEIL {
    return "black";
  }

  let rgb = [r, g, b];
  let mut closest = &PALETTE[0];
  let mut min_distance = f64::INFINITY;
  for color in PALETTE.iter() {
    let distance = distance_sq(rgb, color);
    if distance < min_distance {
      min_distance = distance;
      closest = color;
    }
  }
  closest.name
}

pub fn name_for_rgb(rgb: [u8; 3]) -> &'static str {
  name_for_color(rgb[0] as f64, rgb[1] as f64, rgb[2] as f64)
}

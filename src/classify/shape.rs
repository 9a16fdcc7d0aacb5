// 该文件是 Jihe（几何）项目的一部分。
// src/classify/shape.rs - 形状判定
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

use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{self, Vertex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeName {
  Triangle,
  Square,
  Rectangle,
  Pentagon,
  Hexagon,
  Heptagon,
  Octagon,
  Nonagon,
  Decagon,
  Hendecagon,
  Dodecagon,
  Circle,
  Ellipse,
  Unknown,
}

impl ShapeName {
  /// 5 到 12 条边的多边形名称
  fn polygon(corners: usize) -> Option<Self> {
    match corners {
      5 => Some(ShapeName::Pentagon),
      6 => Some(ShapeName::Hexagon),
      7 => Some(ShapeName::Heptagon),
      8 => Some(ShapeName::Octagon),
      9 => Some(ShapeName::Nonagon),
      10 => Some(ShapeName::Decagon),
      11 => Some(ShapeName::Hendecagon),
      12 => Some(ShapeName::Dodecagon),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      ShapeName::Triangle => "Triangle",
      ShapeName::Square => "Square",
      ShapeName::Rectangle => "Rectangle",
      ShapeName::Pentagon => "Pentagon",
      ShapeName::Hexagon => "Hexagon",
      ShapeName::Heptagon => "Heptagon",
      ShapeName::Octagon => "Octagon",
      ShapeName::Nonagon => "Nonagon",
      ShapeName::Decagon => "Decagon",
      ShapeName::Hendecagon => "Hendecagon",
      ShapeName::Dodecagon => "Dodecagon",
      ShapeName::Circle => "Circle",
      ShapeName::Ellipse => "Ellipse",
      ShapeName::Unknown => "Unknown",
    }
  }

  pub fn as_lowercase(&self) -> String {
    self.as_str().to_lowercase()
  }
}

impl fmt::Display for ShapeName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// 区分正方形与长方形时所用的包围框
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SquareBox {
  /// 轮廓的最小面积旋转矩形，取长边比短边
  MinAreaRect,
  /// 多边形的轴对齐包围框，取宽比高
  AxisAligned,
}

/// 形状判定规则
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeRules {
  pub square_box: SquareBox,
  /// 判为正方形的宽高比闭区间
  pub square_aspect: (f64, f64),
  /// 正方形置信度是否与宽高比置信度取平均
  pub blend_aspect_confidence: bool,
  /// 顶点数严格大于该值才可能判为圆
  pub circle_min_corners: usize,
  /// 圆度严格大于该值才判为圆
  pub circularity: f64,
  /// 按顶点数命名的最大多边形
  pub max_polygon_corners: usize,
  /// 凸且顶点数多于 8 的剩余轮廓判为椭圆
  pub ellipse_fallback: bool,
}

/// 几何+置信度模式使用的规则
pub const GEOMETRY_RULES: ShapeRules = ShapeRules {
  square_box: SquareBox::MinAreaRect,
  square_aspect: (0.95, 1.1),
  blend_aspect_confidence: true,
  circle_min_corners: 8,
  circularity: 0.9,
  max_polygon_corners: 12,
  ellipse_fallback: true,
};

/// 形状+颜色模式使用的规则
pub const COLOR_RULES: ShapeRules = ShapeRules {
  square_box: SquareBox::AxisAligned,
  square_aspect: (0.95, 1.05),
  blend_aspect_confidence: false,
  circle_min_corners: 6,
  circularity: 0.85,
  max_polygon_corners: 6,
  ellipse_fallback: false,
};

const NON_CONVEX_PENALTY: f64 = 0.8;
const UNKNOWN_CONFIDENCE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
  pub name: ShapeName,
  pub corners: usize,
  pub confidence: f64,
}

/// 边长一致性：`max(0, 1 - σ/μ)`，顶点少于 3 个时为 0
pub fn regularity(polygon: &[Vertex]) -> f64 {
  let n = polygon.len();
  if n < 3 {
    return 0.0;
  }

  let sides: Vec<f64> = (0..n)
    .map(|i| {
      let (p, q) = (polygon[i], polygon[(i + 1) % n]);
      ((q.x - p.x) as f64).hypot((q.y - p.y) as f64)
    })
    .collect();

  let mean = sides.iter().sum::<f64>() / n as f64;
  if mean == 0.0 {
    return 0.0;
  }
  let variance = sides.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n as f64;
  (1.0 - variance.sqrt() / mean).max(0.0)
}

/// 圆度 `4πA/P²`，周长为零时返回 None
pub fn circularity(area: f64, perimeter: f64) -> Option<f64> {
  (perimeter > 0.0).then(|| 4.0 * PI * area / (perimeter * perimeter))
}

#[derive(Debug, Clone)]
pub struct ShapeClassifier {
  rules: ShapeRules,
}

impl Default for ShapeClassifier {
  fn default() -> Self {
    Self::new(GEOMETRY_RULES)
  }
}

impl ShapeClassifier {
  pub fn new(rules: ShapeRules) -> Self {
    Self { rules }
  }

  pub fn rules(&self) -> &ShapeRules {
    &self.rules
  }

  /// 根据近似多边形、原始轮廓与凸性判定形状
  pub fn classify(&self, polygon: &[Vertex], contour: &[Vertex], is_convex: bool) -> Classification {
    let rules = &self.rules;
    let corners = polygon.len();
    let area = geometry::contour_area(contour);
    let perimeter = geometry::arc_length(contour);

    let mut confidence = regularity(polygon);
    if !is_convex && corners > 4 {
      confidence *= NON_CONVEX_PENALTY;
    }

    if let Some(roundness) = circularity(area, perimeter)
      && corners > rules.circle_min_corners
      && roundness > rules.circularity
    {
      return Classification {
        name: ShapeName::Circle,
        corners,
        confidence: roundness,
      };
    }

    let (name, confidence) = match corners {
      0..=2 => (ShapeName::Unknown, 0.0),
      3 => (ShapeName::Triangle, confidence),
      4 => self.square_or_rectangle(polygon, contour, confidence),
      n if n <= rules.max_polygon_corners => match ShapeName::polygon(n) {
        Some(name) => (name, confidence),
        None => (ShapeName::Unknown, UNKNOWN_CONFIDENCE),
      },
      n if rules.ellipse_fallback && is_convex && n > 8 => (ShapeName::Ellipse, confidence),
      _ => (ShapeName::Unknown, UNKNOWN_CONFIDENCE),
    };

    Classification {
      name,
      corners,
      confidence,
    }
  }

  fn square_or_rectangle(
    &self,
    polygon: &[Vertex],
    contour: &[Vertex],
    confidence: f64,
  ) -> (ShapeName, f64) {
    let rules = &self.rules;
    let aspect = match rules.square_box {
      SquareBox::MinAreaRect => geometry::min_area_rect(contour).aspect_ratio(),
      SquareBox::AxisAligned => {
        let rect = geometry::bounding_rect(polygon);
        rect.width as f64 / rect.height as f64
      }
    };

    let (low, high) = rules.square_aspect;
    if !(low..=high).contains(&aspect) {
      return (ShapeName::Rectangle, confidence);
    }

    if rules.blend_aspect_confidence {
      let aspect_confidence = 1.0 - (aspect - 1.0) * 10.0;
      (ShapeName::Square, (confidence + aspect_confidence) / 2.0)
    } else {
      (ShapeName::Square, confidence)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use imageproc::point::Point;

  fn pts(raw: &[(i32, i32)]) -> Vec<Vertex> {
    raw.iter().map(|&(x, y)| Point::new(x, y)).collect()
  }

  fn regular(n: usize, radius: f64) -> Vec<Vertex> {
    (0..n)
      .map(|i| {
        let t = 2.0 * PI * i as f64 / n as f64;
        Point::new(
          (2000.0 + radius * t.cos()).round() as i32,
          (2000.0 + radius * t.sin()).round() as i32,
        )
      })
      .collect()
  }

  fn geometry_classify(polygon: &[Vertex]) -> Classification {
    ShapeClassifier::new(GEOMETRY_RULES).classify(polygon, polygon, geometry::is_convex(polygon))
  }

  #[test]
  fn regularity_of_regular_polygons() {
    for n in 3..=12 {
      let score = regularity(&regular(n, 1000.0));
      assert!(score > 0.995, "n = {}: {}", n, score);
    }
    assert_eq!(regularity(&pts(&[(0, 0), (5, 0), (5, 5), (0, 5)])), 1.0);
  }

  #[test]
  fn regularity_of_degenerate_polygons() {
    assert_eq!(regularity(&pts(&[(0, 0), (4, 4)])), 0.0);
    assert_eq!(regularity(&pts(&[(3, 3), (3, 3), (3, 3)])), 0.0);
  }

  #[test]
  fn regular_polygons_up_to_eight_sides_are_named() {
    let expected = [
      (3, ShapeName::Triangle),
      (5, ShapeName::Pentagon),
      (6, ShapeName::Hexagon),
      (7, ShapeName::Heptagon),
      (8, ShapeName::Octagon),
    ];
    for (n, name) in expected {
      let result = geometry_classify(&regular(n, 1000.0));
      assert_eq!(result.name, name);
      assert_eq!(result.corners, n);
      assert!(result.confidence > 0.995, "{}: {}", name, result.confidence);
    }
  }

  #[test]
  fn circle_override_beats_polygon_names() {
    // 正九边形及以上的圆度已超过 0.9
    for n in 9..=12 {
      let polygon = regular(n, 1000.0);
      let result = geometry_classify(&polygon);
      assert_eq!(result.name, ShapeName::Circle);
      let area = geometry::contour_area(&polygon);
      let perimeter = geometry::arc_length(&polygon);
      assert_eq!(result.confidence, circularity(area, perimeter).unwrap());
    }
  }

  #[test]
  fn polygon_names_when_contour_is_not_round() {
    // 多边形来自一条细长轮廓时不触发圆判定
    let contour = pts(&[(0, 0), (400, 0), (400, 20), (0, 20)]);
    let names = [
      ShapeName::Nonagon,
      ShapeName::Decagon,
      ShapeName::Hendecagon,
      ShapeName::Dodecagon,
    ];
    for (n, name) in (9..=12).zip(names) {
      let polygon = regular(n, 1000.0);
      let result = ShapeClassifier::new(GEOMETRY_RULES).classify(&polygon, &contour, true);
      assert_eq!(result.name, name);
      assert!(result.confidence > 0.995);
    }
  }

  #[test]
  fn unit_square_is_square_with_full_confidence() {
    let result = geometry_classify(&pts(&[(0, 0), (1, 0), (1, 1), (0, 1)]));
    assert_eq!(result.name, ShapeName::Square);
    assert_eq!(result.corners, 4);
    assert!((result.confidence - 1.0).abs() < 1e-12);
  }

  #[test]
  fn slightly_long_square_blends_aspect_confidence() {
    // 宽高比 1.05：方差项 σ/μ = 0.05/2.05
    let result = geometry_classify(&pts(&[(0, 0), (105, 0), (105, 100), (0, 100)]));
    assert_eq!(result.name, ShapeName::Square);
    let regular = 1.0 - 2.5 / 102.5;
    let aspect = 1.0 - 0.05 * 10.0;
    assert!((result.confidence - (regular + aspect) / 2.0).abs() < 1e-9);
  }

  #[test]
  fn rotated_square_uses_min_area_rect() {
    let result = geometry_classify(&pts(&[(50, 10), (90, 50), (50, 90), (10, 50)]));
    assert_eq!(result.name, ShapeName::Square);
  }

  #[test]
  fn two_to_one_quadrilateral_is_rectangle() {
    let result = geometry_classify(&pts(&[(0, 0), (40, 0), (40, 20), (0, 20)]));
    assert_eq!(result.name, ShapeName::Rectangle);
    assert!((result.confidence - (1.0 - 10.0 / 30.0)).abs() < 1e-9);
  }

  #[test]
  fn round_contour_with_many_corners_is_circle() {
    let circle = regular(64, 200.0);
    let result = geometry_classify(&circle);
    assert_eq!(result.name, ShapeName::Circle);
    assert!(result.confidence > 0.99);
  }

  #[test]
  fn flat_convex_contour_falls_through_to_ellipse() {
    let ellipse: Vec<Vertex> = (0..20)
      .map(|i| {
        let t = 2.0 * PI * i as f64 / 20.0;
        Point::new(
          (500.0 + 400.0 * t.cos()).round() as i32,
          (500.0 + 60.0 * t.sin()).round() as i32,
        )
      })
      .collect();
    let result = geometry_classify(&ellipse);
    assert_eq!(result.name, ShapeName::Ellipse);
    assert_eq!(result.corners, 20);
  }

  #[test]
  fn non_convex_many_corners_is_unknown() {
    // 十四角星形
    let star: Vec<Vertex> = (0..14)
      .map(|i| {
        let t = 2.0 * PI * i as f64 / 14.0;
        let r = if i % 2 == 0 { 300.0 } else { 120.0 };
        Point::new(
          (500.0 + r * t.cos()).round() as i32,
          (500.0 + r * t.sin()).round() as i32,
        )
      })
      .collect();
    let result = geometry_classify(&star);
    assert_eq!(result.name, ShapeName::Unknown);
    assert_eq!(result.confidence, 0.1);
  }

  #[test]
  fn non_convex_penalty_applies_above_four_corners() {
    // 凹五边形（房屋形状倒置）
    let polygon = pts(&[(0, 0), (100, 0), (100, 100), (50, 50), (0, 100)]);
    let convex = ShapeClassifier::default().classify(&polygon, &polygon, true);
    let concave = ShapeClassifier::default().classify(&polygon, &polygon, false);
    assert_eq!(concave.name, ShapeName::Pentagon);
    assert!((concave.confidence - convex.confidence * 0.8).abs() < 1e-12);
  }

  #[test]
  fn fewer_than_three_corners_have_zero_confidence() {
    let contour = regular(64, 200.0);
    for polygon in [pts(&[]), pts(&[(0, 0)]), pts(&[(0, 0), (10, 10)])] {
      let result = ShapeClassifier::default().classify(&polygon, &contour, true);
      assert_eq!(result.name, ShapeName::Unknown);
      assert_eq!(result.confidence, 0.0);
    }
  }

  #[test]
  fn zero_perimeter_degrades_gracefully() {
    let polygon = pts(&[(5, 5), (5, 5), (5, 5)]);
    let result = ShapeClassifier::default().classify(&polygon, &polygon, false);
    assert_eq!(result.name, ShapeName::Triangle);
    assert_eq!(result.confidence, 0.0);
  }

  #[test]
  fn color_rules_use_axis_aligned_box_and_looser_circle() {
    let classifier = ShapeClassifier::new(COLOR_RULES);

    // 宽高比 1.08 超出 [0.95, 1.05]
    let wide = pts(&[(0, 0), (107, 0), (107, 99), (0, 99)]);
    assert_eq!(classifier.classify(&wide, &wide, true).name, ShapeName::Rectangle);

    // 旋转 45° 的正方形在轴对齐包围框下仍为 1:1
    let diamond = pts(&[(50, 10), (90, 50), (50, 90), (10, 50)]);
    assert_eq!(classifier.classify(&diamond, &diamond, true).name, ShapeName::Square);

    // 正八边形：圆度约 0.948 > 0.85 且顶点数 > 6
    let octagon = regular(8, 500.0);
    assert_eq!(classifier.classify(&octagon, &octagon, true).name, ShapeName::Circle);

    // 七个顶点但圆度不足
    let contour = pts(&[(0, 0), (400, 0), (400, 20), (0, 20)]);
    let heptagon = regular(7, 500.0);
    assert_eq!(
      classifier.classify(&heptagon, &contour, true).name,
      ShapeName::Unknown
    );
  }

  #[test]
  fn names_render_in_both_cases() {
    assert_eq!(ShapeName::Hendecagon.to_string(), "Hendecagon");
    assert_eq!(ShapeName::Circle.as_lowercase(), "circle");
  }
}

// 该文件是 Jihe（几何）项目的一部分。
// src/geometry.rs - 轮廓几何计算
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

use imageproc::{
  geometry::{approximate_polygon_dp, convex_hull},
  point::Point,
};

/// 轮廓与多边形的顶点类型（像素坐标）
pub type Vertex = Point<i32>;

/// 轴对齐包围框，宽高包含边界像素
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingRect {
  pub x: i32,
  pub y: i32,
  pub width: u32,
  pub height: u32,
}

/// 最小面积旋转矩形
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatedRect {
  pub center: (f64, f64),
  pub width: f64,
  pub height: f64,
  /// 宽边方向，单位为度
  pub angle: f64,
}

impl RotatedRect {
  /// 长边与短边之比，短边为零时返回无穷大
  pub fn aspect_ratio(&self) -> f64 {
    let long = self.width.max(self.height);
    let short = self.width.min(self.height);
    if short <= 0.0 {
      f64::INFINITY
    } else {
      long / short
    }
  }
}

/// 多边形的零阶与一阶矩
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Moments {
  pub m00: f64,
  pub m10: f64,
  pub m01: f64,
}

impl Moments {
  /// 质心，面积为零时返回 None
  pub fn centroid(&self) -> Option<(f64, f64)> {
    if self.m00 == 0.0 {
      None
    } else {
      Some((self.m10 / self.m00, self.m01 / self.m00))
    }
  }
}

/// 多边形面积（鞋带公式，不区分方向）
pub fn contour_area(points: &[Vertex]) -> f64 {
  if points.len() < 3 {
    return 0.0;
  }
  let twice: i64 = cyclic_edges(points)
    .map(|(p, q)| p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64)
    .sum();
  (twice as f64 / 2.0).abs()
}

/// 闭合轮廓周长
pub fn arc_length(points: &[Vertex]) -> f64 {
  if points.len() < 2 {
    return 0.0;
  }
  imageproc::geometry::arc_length(points, true)
}

/// 以格林公式计算多边形矩，结果与顶点方向无关
pub fn moments(points: &[Vertex]) -> Moments {
  if points.len() < 3 {
    return Moments::default();
  }

  let mut m = Moments::default();
  for (p, q) in cyclic_edges(points) {
    let (x0, y0) = (p.x as f64, p.y as f64);
    let (x1, y1) = (q.x as f64, q.y as f64);
    let a = x0 * y1 - x1 * y0;
    m.m00 += a;
    m.m10 += a * (x0 + x1);
    m.m01 += a * (y0 + y1);
  }
  m.m00 /= 2.0;
  m.m10 /= 6.0;
  m.m01 /= 6.0;

  if m.m00 < 0.0 {
    m.m00 = -m.m00;
    m.m10 = -m.m10;
    m.m01 = -m.m01;
  }
  m
}

/// 质心（四舍五入到像素）；面积为零时退化为顶点均值
pub fn centroid(points: &[Vertex]) -> (i32, i32) {
  if let Some((cx, cy)) = moments(points).centroid() {
    return (cx.round() as i32, cy.round() as i32);
  }
  if points.is_empty() {
    return (0, 0);
  }
  let n = points.len() as f64;
  let sx: f64 = points.iter().map(|p| p.x as f64).sum();
  let sy: f64 = points.iter().map(|p| p.y as f64).sum();
  ((sx / n).round() as i32, (sy / n).round() as i32)
}

pub fn bounding_rect(points: &[Vertex]) -> BoundingRect {
  let Some(first) = points.first() else {
    return BoundingRect {
      x: 0,
      y: 0,
      width: 0,
      height: 0,
    };
  };

  let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
  for p in points.iter().skip(1) {
    min_x = min_x.min(p.x);
    min_y = min_y.min(p.y);
    max_x = max_x.max(p.x);
    max_y = max_y.max(p.y);
  }

  BoundingRect {
    x: min_x,
    y: min_y,
    width: (max_x - min_x + 1) as u32,
    height: (max_y - min_y + 1) as u32,
  }
}

/// 多边形凸性判定：所有非零叉积同号即为凸，少于 3 个顶点不视为凸
pub fn is_convex(polygon: &[Vertex]) -> bool {
  let n = polygon.len();
  if n < 3 {
    return false;
  }

  let mut sign = 0i64;
  for i in 0..n {
    let a = polygon[i];
    let b = polygon[(i + 1) % n];
    let c = polygon[(i + 2) % n];
    let cross = (b.x - a.x) as i64 * (c.y - b.y) as i64 - (b.y - a.y) as i64 * (c.x - b.x) as i64;
    if cross == 0 {
      continue;
    }
    if sign == 0 {
      sign = cross.signum();
    } else if sign != cross.signum() {
      return false;
    }
  }
  sign != 0
}

/// 最小面积旋转矩形（凸包上的旋转卡壳）
pub fn min_area_rect(points: &[Vertex]) -> RotatedRect {
  let hull: Vec<(f64, f64)> = convex_hull(points)
    .into_iter()
    .map(|p| (p.x as f64, p.y as f64))
    .collect();

  match hull.len() {
    0 => RotatedRect {
      center: (0.0, 0.0),
      width: 0.0,
      height: 0.0,
      angle: 0.0,
    },
    1 => RotatedRect {
      center: hull[0],
      width: 0.0,
      height: 0.0,
      angle: 0.0,
    },
    2 => {
      let (p, q) = (hull[0], hull[1]);
      let (dx, dy) = (q.0 - p.0, q.1 - p.1);
      RotatedRect {
        center: ((p.0 + q.0) / 2.0, (p.1 + q.1) / 2.0),
        width: dx.hypot(dy),
        height: 0.0,
        angle: dy.atan2(dx).to_degrees(),
      }
    }
    n => {
      let mut best: Option<(f64, RotatedRect)> = None;
      for i in 0..n {
        let (p, q) = (hull[i], hull[(i + 1) % n]);
        let (dx, dy) = (q.0 - p.0, q.1 - p.1);
        let len = dx.hypot(dy);
        if len == 0.0 {
          continue;
        }
        let (ux, uy) = (dx / len, dy / len);
        let (vx, vy) = (-uy, ux);

        let (mut u_min, mut u_max, mut v_min, mut v_max) =
          (f64::MAX, f64::MIN, f64::MAX, f64::MIN);
        for &(x, y) in &hull {
          let u = x * ux + y * uy;
          let v = x * vx + y * vy;
          u_min = u_min.min(u);
          u_max = u_max.max(u);
          v_min = v_min.min(v);
          v_max = v_max.max(v);
        }

        let width = u_max - u_min;
        let height = v_max - v_min;
        let area = width * height;
        if best.as_ref().is_none_or(|(a, _)| area < *a) {
          let cu = (u_min + u_max) / 2.0;
          let cv = (v_min + v_max) / 2.0;
          best = Some((
            area,
            RotatedRect {
              center: (cu * ux + cv * vx, cu * uy + cv * vy),
              width,
              height,
              angle: uy.atan2(ux).to_degrees(),
            },
          ));
        }
      }
      best.map(|(_, rect)| rect).unwrap_or(RotatedRect {
        center: hull[0],
        width: 0.0,
        height: 0.0,
        angle: 0.0,
      })
    }
  }
}

/// 闭合曲线的 Douglas-Peucker 近似
///
/// 先取两个相距最远的锚点把曲线切成两段开放折线，再分别交给
/// `approximate_polygon_dp` 简化。返回的多边形不重复首个顶点。
pub fn approximate_closed(curve: &[Vertex], epsilon: f64) -> Vec<Vertex> {
  let points = dedup_closed(curve);
  if points.len() < 3 || epsilon <= 0.0 {
    return points;
  }

  let first = farthest_from(&points, points[0]);
  let second = farthest_from(&points, points[first]);
  let (a, b) = (first.min(second), first.max(second));
  if a == b {
    return points;
  }

  let head = &points[a..=b];
  let tail: Vec<Vertex> = points[b..].iter().chain(points[..=a].iter()).copied().collect();

  let mut polygon = approximate_polygon_dp(head, epsilon, false);
  polygon.pop();
  let mut rest = approximate_polygon_dp(&tail, epsilon, false);
  rest.pop();
  polygon.extend(rest);
  polygon
}

/// 去除相邻重复点以及与首点重合的末尾点
pub fn dedup_closed(curve: &[Vertex]) -> Vec<Vertex> {
  let mut points: Vec<Vertex> = curve.to_vec();
  points.dedup();
  while points.len() > 1 && points.first() == points.last() {
    points.pop();
  }
  points
}

fn farthest_from(points: &[Vertex], origin: Vertex) -> usize {
  let mut index = 0;
  let mut best = -1i64;
  for (i, p) in points.iter().enumerate() {
    let dx = (p.x - origin.x) as i64;
    let dy = (p.y - origin.y) as i64;
    let d = dx * dx + dy * dy;
    if d > best {
      best = d;
      index = i;
    }
  }
  index
}

fn cyclic_edges(points: &[Vertex]) -> impl Iterator<Item = (Vertex, Vertex)> + '_ {
  points
    .iter()
    .zip(points.iter().cycle().skip(1))
    .map(|(p, q)| (*p, *q))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn pts(raw: &[(i32, i32)]) -> Vec<Vertex> {
    raw.iter().map(|&(x, y)| Point::new(x, y)).collect()
  }

  /// 沿正方形边界逐像素采样的轮廓
  fn square_outline(x0: i32, y0: i32, side: i32) -> Vec<Vertex> {
    let mut out = Vec::new();
    for x in x0..x0 + side {
      out.push(Point::new(x, y0));
    }
    for y in y0..y0 + side {
      out.push(Point::new(x0 + side, y));
    }
    for x in (x0 + 1..=x0 + side).rev() {
      out.push(Point::new(x, y0 + side));
    }
    for y in (y0 + 1..=y0 + side).rev() {
      out.push(Point::new(x0, y));
    }
    out
  }

  #[test]
  fn area_and_perimeter_of_rectangle() {
    let rect = pts(&[(0, 0), (20, 0), (20, 10), (0, 10)]);
    assert_eq!(contour_area(&rect), 200.0);
    assert!((arc_length(&rect) - 60.0).abs() < 1e-9);

    let reversed: Vec<Vertex> = rect.iter().rev().copied().collect();
    assert_eq!(contour_area(&reversed), 200.0);
  }

  #[test]
  fn degenerate_shapes_have_zero_measures() {
    assert_eq!(contour_area(&pts(&[(1, 1), (5, 5)])), 0.0);
    assert_eq!(arc_length(&pts(&[(1, 1)])), 0.0);
    assert_eq!(moments(&pts(&[(1, 1), (2, 2)])), Moments::default());
  }

  #[test]
  fn centroid_of_square_is_its_middle() {
    let square = pts(&[(10, 10), (30, 10), (30, 30), (10, 30)]);
    assert_eq!(centroid(&square), (20, 20));
    let reversed: Vec<Vertex> = square.iter().rev().copied().collect();
    assert_eq!(centroid(&reversed), (20, 20));
  }

  #[test]
  fn centroid_falls_back_to_point_mean() {
    let line = pts(&[(0, 0), (10, 0), (20, 0)]);
    assert_eq!(centroid(&line), (10, 0));
  }

  #[test]
  fn bounding_rect_counts_pixels() {
    let rect = bounding_rect(&pts(&[(2, 3), (11, 3), (11, 7), (2, 7)]));
    assert_eq!(
      rect,
      BoundingRect {
        x: 2,
        y: 3,
        width: 10,
        height: 5
      }
    );
  }

  #[test]
  fn convexity() {
    assert!(is_convex(&pts(&[(0, 0), (10, 0), (10, 10), (0, 10)])));
    assert!(is_convex(&pts(&[(0, 10), (10, 10), (10, 0), (0, 0)])));
    // 凹多边形（箭头）
    assert!(!is_convex(&pts(&[(0, 0), (10, 5), (0, 10), (4, 5)])));
    assert!(!is_convex(&pts(&[(0, 0), (10, 0)])));
  }

  #[test]
  fn min_area_rect_of_rotated_square() {
    let diamond = pts(&[(50, 10), (90, 50), (50, 90), (10, 50)]);
    let rect = min_area_rect(&diamond);
    assert!((rect.aspect_ratio() - 1.0).abs() < 1e-9);
    assert!((rect.width * rect.height - 3200.0).abs() < 1e-6);
    assert!((rect.center.0 - 50.0).abs() < 1e-9);
    assert!((rect.center.1 - 50.0).abs() < 1e-9);
  }

  #[test]
  fn min_area_rect_of_wide_rectangle() {
    let rect = min_area_rect(&pts(&[(0, 0), (40, 0), (40, 20), (0, 20)]));
    assert!((rect.aspect_ratio() - 2.0).abs() < 1e-9);
  }

  #[test]
  fn approximate_square_outline_to_corners() {
    let outline = square_outline(10, 10, 40);
    let polygon = approximate_closed(&outline, 0.02 * arc_length(&outline));
    assert_eq!(polygon.len(), 4);
    for corner in pts(&[(10, 10), (50, 10), (50, 50), (10, 50)]) {
      assert!(polygon.contains(&corner), "missing corner {:?}", corner);
    }
  }

  #[test]
  fn approximate_keeps_tiny_inputs() {
    let line = pts(&[(0, 0), (0, 0), (5, 5)]);
    assert_eq!(approximate_closed(&line, 1.0), pts(&[(0, 0), (5, 5)]));
    let triangle = pts(&[(0, 0), (10, 0), (0, 10)]);
    assert_eq!(approximate_closed(&triangle, 0.0), triangle);
  }
}

// 该文件是 Jihe（几何）项目的一部分。
// tests/pipeline_test.rs - 端到端检测测试
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

use image::{Rgb, RgbImage};
use imageproc::{
  drawing::{draw_filled_circle_mut, draw_filled_rect_mut},
  rect::Rect,
};
use url::Url;

use jihe::{
  FromUrl,
  classify::ShapeName,
  detector::{DetectError, Detector, ShapeColorDetector, ShapeDetector},
  output::{RecordFileOutput, Render},
  vision::{ImageprocVision, Readiness},
};

/// 白底上一个黑色正方形和一个红色圆
fn square_and_circle() -> RgbImage {
  let mut image = RgbImage::from_pixel(320, 200, Rgb([255, 255, 255]));
  draw_filled_rect_mut(&mut image, Rect::at(30, 60).of_size(80, 80), Rgb([0, 0, 0]));
  draw_filled_circle_mut(&mut image, (220, 100), 60, Rgb([255, 0, 0]));
  image
}

#[test]
fn threshold_mode_names_shapes_and_colors() {
  let detector = ShapeColorDetector::new(ImageprocVision::new());
  let result = detector.detect(&square_and_circle()).unwrap();
  let pairs: Vec<(&str, &str)> = result
    .items
    .iter()
    .map(|item| (item.shape.as_str(), item.color))
    .collect();

  assert!(
    pairs.contains(&("square", "black")) || pairs.contains(&("rectangle", "black")),
    "{pairs:?}"
  );
  assert!(pairs.contains(&("circle", "red")), "{pairs:?}");
  assert_eq!(pairs.len(), 2, "{pairs:?}");
  assert!(pairs.iter().all(|(shape, _)| *shape != "unknown"));
  assert!(
    pairs
      .iter()
      .all(|(shape, _)| shape.chars().all(|c| c.is_ascii_lowercase()))
  );
}

#[test]
fn edge_mode_reports_geometry() {
  let detector = ShapeDetector::new(ImageprocVision::new());
  let result = detector.detect(&square_and_circle()).unwrap();
  assert!(!result.is_empty());

  let square = result
    .items
    .iter()
    .find(|s| s.name == ShapeName::Square || s.name == ShapeName::Rectangle)
    .expect("应检测到四边形");
  assert_eq!(square.corners, 4);
  assert!((square.center.x - 70).abs() <= 3, "{square:?}");
  assert!((square.center.y - 100).abs() <= 3, "{square:?}");
  assert!(square.area >= 100.0);

  let round = result
    .items
    .iter()
    .find(|s| s.corners >= 7)
    .expect("应检测到圆形轮廓");
  assert!((round.center.x - 220).abs() <= 3, "{round:?}");
  assert!((round.center.y - 100).abs() <= 3, "{round:?}");

  for shape in result.items.iter() {
    assert!((0.0..=1.0).contains(&shape.confidence), "{shape:?}");
  }

  let sorted = result.sorted_by_confidence();
  assert!(sorted.windows(2).all(|w| w[0].confidence >= w[1].confidence));
}

#[test]
fn detection_waits_for_readiness() {
  let readiness = Readiness::new();
  let detector = ShapeColorDetector::new(ImageprocVision::with_readiness(readiness.clone()));
  let image = square_and_circle();

  assert_eq!(detector.detect(&image).unwrap_err(), DetectError::NotReady);

  let signal = readiness.clone();
  let handle = std::thread::spawn(move || signal.mark_ready());
  assert!(detector.wait_ready(Duration::from_secs(5)));
  handle.join().unwrap();
  assert!(!detector.detect(&image).unwrap().is_empty());
}

#[test]
fn json_record_parses_back() {
  let path = std::env::temp_dir()
    .join("jihe-pipeline-test")
    .join("shapes.json");
  let url = Url::parse(&format!("record://{}?format=json", path.display())).unwrap();
  let output = RecordFileOutput::from_url(&url).unwrap();

  let image = square_and_circle();
  let result = ShapeDetector::new(ImageprocVision::new())
    .detect(&image)
    .unwrap();
  output.render_result(&image, &result).unwrap();

  let content = std::fs::read_to_string(&path).unwrap();
  let json: serde_json::Value = serde_json::from_str(&content).unwrap();
  assert!(json["generated_at"].is_string());
  let items = json["items"].as_array().unwrap();
  assert_eq!(items.len(), result.len());
  assert!(items.iter().all(|item| item["id"].as_str().is_some_and(|id| id.starts_with("shape-"))));
}

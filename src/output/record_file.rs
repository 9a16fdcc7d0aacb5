// 该文件是 Jihe（几何）项目的一部分。
// src/output/record_file.rs - 检测结果记录
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

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  detector::{DetectResult, DetectedShape, ShapeColor},
  output::Render,
};

#[derive(Error, Debug)]
pub enum RecordFileError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("不支持的记录格式: {0}")]
  UnknownFormat(String),
  #[error("路径解码失败: {0}")]
  PathDecode(#[from] std::string::FromUtf8Error),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
  /// 每个结果一行，逗号分隔
  Text,
  Json,
}

/// 一条结果的文本行
pub trait RecordLine {
  fn record_line(&self) -> String;
}

impl RecordLine for DetectedShape {
  fn record_line(&self) -> String {
    format!(
      "{}, {:.4}, {}, {:.1}, {}, {}",
      self.name, self.confidence, self.corners, self.area, self.center.x, self.center.y
    )
  }
}

impl RecordLine for ShapeColor {
  fn record_line(&self) -> String {
    format!("{}, {}", self.shape, self.color)
  }
}

#[derive(Serialize)]
struct RecordDocument<'a, T> {
  generated_at: String,
  items: &'a [T],
}

/// `record:///path/out.txt` 或 `record:///path/out.json?format=json`
pub struct RecordFileOutput {
  path: PathBuf,
  format: RecordFormat,
}

impl FromUrlWithScheme for RecordFileOutput {
  const SCHEME: &'static str = "record";
}

impl FromUrl for RecordFileOutput {
  type Error = RecordFileError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(RecordFileError::SchemeMismatch);
    }

    let mut format = RecordFormat::Text;
    for (k, v) in uri.query_pairs() {
      if k == "format" {
        format = match v.as_ref() {
          "text" | "txt" => RecordFormat::Text,
          "json" => RecordFormat::Json,
          other => return Err(RecordFileError::UnknownFormat(other.to_string())),
        };
        break;
      }
    }

    Ok(RecordFileOutput {
      path: PathBuf::from(urlencoding::decode(uri.path())?.into_owned()),
      format,
    })
  }
}

impl RecordFileOutput {
  pub fn new<P: AsRef<Path>>(path: P, format: RecordFormat) -> Self {
    Self {
      path: path.as_ref().to_path_buf(),
      format,
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn format(&self) -> RecordFormat {
    self.format
  }

  fn write_records<T: RecordLine + Serialize>(&self, items: &[T]) -> Result<(), RecordFileError> {
    let content = match self.format {
      RecordFormat::Text => items
        .iter()
        .map(RecordLine::record_line)
        .collect::<Vec<_>>()
        .join("\n"),
      RecordFormat::Json => serde_json::to_string_pretty(&RecordDocument {
        generated_at: Utc::now().to_rfc3339(),
        items,
      })?,
    };

    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&self.path, content)?;

    warn!("保存 {} 条记录到文件: {}", items.len(), self.path.display());
    Ok(())
  }
}

impl<F, T: RecordLine + Serialize> Render<F, DetectResult<T>> for RecordFileOutput {
  type Error = RecordFileError;

  fn render_result(&self, _frame: &F, result: &DetectResult<T>) -> Result<(), Self::Error> {
    self.write_records(&result.items)
  }
}

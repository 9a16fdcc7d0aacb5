// 该文件是 Jihe（几何）项目的一部分。
// src/task.rs - 检测任务
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

use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::{
  detector::{DetectError, Detector},
  output::Render,
};

pub trait Task<I, D, O>: Sized {
  type Error;
  fn run_task(self, input: I, detector: D, output: O) -> Result<(), Self::Error>;
}

/// 等待视觉库就绪后对第一帧执行一次检测
#[derive(Debug, Clone, Copy)]
pub struct OneShotTask {
  ready_timeout: Duration,
}

impl Default for OneShotTask {
  fn default() -> Self {
    Self {
      ready_timeout: Duration::from_secs(10),
    }
  }
}

impl OneShotTask {
  pub fn with_ready_timeout(mut self, ready_timeout: Duration) -> Self {
    self.ready_timeout = ready_timeout;
    self
  }
}

impl<
  F,
  R,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  D: Detector<Input = F, Output = R, Error = DetectError>,
  O: Render<F, R, Error = RE>,
> Task<I, D, O> for OneShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, detector: D, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    if !detector.wait_ready(self.ready_timeout) {
      error!("等待视觉库就绪超时: {:.2?}", self.ready_timeout);
      anyhow::bail!(DetectError::NotReady.user_message());
    }

    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!("输入帧获取成功，开始检测...");
    let now = Instant::now();
    let result = detector.detect(&frame).map_err(|e| {
      error!("检测失败: {}", e);
      anyhow::anyhow!(e.user_message())
    })?;
    let elapsed = now.elapsed();
    info!("检测完成，耗时: {:.2?}", elapsed);
    output.render_result(&frame, &result)?;
    info!("渲染完成，耗时: {:.2?}", now.elapsed());

    Ok(())
  }
}

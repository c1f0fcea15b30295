//! 运行控制信号 - 基础设施层
//!
//! 暂停 / 继续 / 停止的协作式信号。工作任务只在检查点观察信号，
//! 正在进行的识别或清理请求不会被打断。

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

/// 运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Paused,
    Stopping,
    Completed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "空闲",
            RunState::Running => "运行中",
            RunState::Paused => "已暂停",
            RunState::Stopping => "正在停止",
            RunState::Completed => "已完成",
        };
        f.write_str(name)
    }
}

/// 运行控制句柄
///
/// 克隆开销很小，可以同时交给工作任务和发出控制信号的一方。
/// 停止总是优先于暂停。
#[derive(Debug, Clone)]
pub struct RunControl {
    tx: Arc<watch::Sender<RunState>>,
}

impl RunControl {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(RunState::Idle);
        Self { tx: Arc::new(tx) }
    }

    /// 当前状态
    pub fn state(&self) -> RunState {
        *self.tx.borrow()
    }

    /// 订阅状态变化
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.tx.subscribe()
    }

    /// 开始新的运行，清除之前的暂停 / 停止
    pub fn begin(&self) {
        self.tx.send_replace(RunState::Running);
    }

    /// 运行 → 暂停
    pub fn pause(&self) -> bool {
        self.transition(|state| match state {
            RunState::Running => Some(RunState::Paused),
            _ => None,
        })
    }

    /// 暂停 → 运行
    pub fn resume(&self) -> bool {
        self.transition(|state| match state {
            RunState::Paused => Some(RunState::Running),
            _ => None,
        })
    }

    /// 运行 / 暂停 → 停止
    pub fn stop(&self) -> bool {
        self.transition(|state| match state {
            RunState::Running | RunState::Paused => Some(RunState::Stopping),
            _ => None,
        })
    }

    /// 任意状态 → 完成
    pub fn finish(&self) {
        self.tx.send_replace(RunState::Completed);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.state() == RunState::Stopping
    }

    /// 检查点：已请求停止时返回 false；暂停时等待，直到继续（true）或停止（false）
    pub async fn checkpoint(&self) -> bool {
        let mut rx = self.tx.subscribe();
        let mut announced = false;

        loop {
            let state = *rx.borrow_and_update();
            match state {
                RunState::Stopping => return false,
                RunState::Paused => {
                    if !announced {
                        info!("⏸️ 处理已暂停，等待继续...");
                        announced = true;
                    }
                }
                _ => {
                    if announced {
                        info!("▶️ 继续处理");
                    }
                    return true;
                }
            }

            // 发送端由 self 持有，通道不会关闭
            if rx.changed().await.is_err() {
                return false;
            }
        }
    }

    fn transition(&self, next: impl FnOnce(RunState) -> Option<RunState>) -> bool {
        self.tx.send_if_modified(|state| match next(*state) {
            Some(new_state) => {
                *state = new_state;
                true
            }
            None => false,
        })
    }
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new()
    }
}

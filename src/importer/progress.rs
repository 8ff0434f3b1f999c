// ==========================================
// 测试用例导入 - 进度上报
// ==========================================
// 方式: tokio 无界通道，发送即忘；接收端关闭或缓慢都不阻塞管道
// ==========================================

use crate::domain::import::ProgressEvent;
use crate::domain::types::ImportStage;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    sender: Option<UnboundedSender<ProgressEvent>>,
}

impl ProgressReporter {
    /// 不上报进度
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    /// 创建上报器与接收端
    pub fn channel() -> (Self, UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self { sender: Some(tx) }, rx)
    }

    /// 在阶段固定检查点上报
    pub fn report(&self, stage: ImportStage, current: usize, total: usize, message: impl Into<String>) {
        if let Some(sender) = &self.sender {
            // 接收端已关闭时忽略
            let _ = sender.send(ProgressEvent {
                stage,
                percent: stage.checkpoint(),
                current,
                total,
                message: message.into(),
            });
        }
    }
}

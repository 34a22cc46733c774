//! # ReactiveProperty — 响应式属性内核
//!
//! 下载器内部共享状态（下载状态机、进度）的公共基础设施，基于 [`tokio::sync::watch`]。
//! 读取无锁（借用 watch 缓存），写入立即广播给所有监听者。
//!
//! 条件更新 [`ReactiveProperty::update_if`] 在 watch 内部锁中完成「检查 + 修改」，
//! 状态机的合法性校验依赖这一点，不会出现两个调用方同时通过校验的情况。

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tokio::sync::watch::error::RecvError;

// ──────────────────────────── Error ────────────────────────────

/// 响应式属性统一错误类型
#[derive(Debug, Error)]
pub enum ReactivePropertyError {
    /// 属性的全部持有者都已释放
    #[error("属性已被销毁")]
    WatcherClosed,

    /// watch 通道接收失败
    #[error("接收失败: {0}")]
    RecvError(#[from] RecvError),
}

// ──────────────────────────── ReactiveProperty ────────────────────────────

/// 响应式属性内核：提供 new / update / update_field / update_if / get_current / watch 等基础能力。
///
/// Clone 得到的是同一个属性的共享句柄。
#[derive(Debug)]
pub struct ReactiveProperty<T> {
    sender: Arc<watch::Sender<T>>,
}

impl<T> Clone for ReactiveProperty<T> {
    fn clone(&self) -> Self {
        Self {
            sender: Arc::clone(&self.sender),
        }
    }
}

impl<T> ReactiveProperty<T>
where
    T: Clone + Send + Sync,
{
    /// 创建一个新的响应式属性。
    pub fn new(value: T) -> Self {
        let (sender, _) = watch::channel(value);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// 无条件覆盖属性值，所有监听者都会收到通知。
    pub fn update(&self, new_value: T) {
        self.sender.send_replace(new_value);
    }

    /// 原地修改属性中的某个字段，无需 clone 整个值，修改后总会通知监听者。
    pub fn update_field<F>(&self, modify: F)
    where
        F: FnOnce(&mut T),
    {
        self.sender.send_modify(modify);
    }

    /// 条件更新：闭包拿到当前值的可变引用，返回 `true` 表示已修改并通知监听者。
    ///
    /// 闭包在 watch 的写锁内执行，「读取 → 判断 → 修改」对其他写者是原子的。
    /// 闭包内不要再访问同一个属性，否则会死锁。
    pub fn update_if<F>(&self, modify: F) -> bool
    where
        F: FnOnce(&mut T) -> bool,
    {
        self.sender.send_if_modified(modify)
    }

    /// 获取当前属性值的快照（会 clone）。
    pub fn get_current(&self) -> T {
        self.sender.borrow().clone()
    }

    /// 对当前值应用转换函数，不 clone 整个值。
    pub fn map<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.sender.borrow())
    }

    /// 创建一个监听器，用于异步监听属性值的变化。
    ///
    /// 监听器只会收到创建之后发生的变化。
    pub fn watch(&self) -> PropertyWatcher<T> {
        PropertyWatcher {
            receiver: self.sender.subscribe(),
        }
    }
}

// ──────────────────────────── PropertyWatcher ────────────────────────────

/// 属性监听器，用于异步接收属性值的变化。
///
/// 不持有属性本身：属性的全部句柄释放后，[`PropertyWatcher::changed`] 返回错误。
#[derive(Debug)]
pub struct PropertyWatcher<T> {
    receiver: watch::Receiver<T>,
}

impl<T> PropertyWatcher<T>
where
    T: Clone + Send + Sync,
{
    /// 异步等待属性值的变化，返回新值。
    pub async fn changed(&mut self) -> Result<T, ReactivePropertyError> {
        self.receiver.changed().await?;
        Ok(self.receiver.borrow_and_update().clone())
    }

    /// 同步获取当前值的克隆。
    pub fn borrow(&self) -> T {
        self.receiver.borrow().clone()
    }
}

use std::fmt;
use std::sync::Arc;

use crate::internal::downloader::traits::progress::ProgressReporter;

/// 上报器容器：按注册顺序依次通知。Clone 后共享同一组上报器。
#[derive(Default, Clone)]
pub struct ProgressReportersContainer {
    reporters: Vec<Arc<dyn ProgressReporter>>,
}

impl ProgressReportersContainer {
    /// 添加一个上报器；支持多次调用以注册多个。
    pub fn add(&mut self, reporter: impl ProgressReporter + 'static) {
        self.reporters.push(Arc::new(reporter));
    }

    pub fn is_empty(&self) -> bool {
        self.reporters.is_empty()
    }

    pub fn run_on_bytes(&self, n: u64) {
        for r in &self.reporters {
            r.on_bytes(n);
        }
    }

    pub fn run_on_progress(&self, bytes_done: u64, total: Option<u64>) {
        for r in &self.reporters {
            r.on_progress(bytes_done, total);
        }
    }
}

impl fmt::Debug for ProgressReportersContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressReportersContainer")
            .field("reporters", &self.reporters.len())
            .finish()
    }
}

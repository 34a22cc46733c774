//! 单回调适配器：将闭包包装成 [`ProgressReporter`]，供 `with_on_xx` 使用。

use crate::internal::downloader::traits::progress::ProgressReporter;

/// 仅实现「增量字节」的适配器。
pub(crate) struct OnBytesReporterAdapter<F>(pub(crate) F);

impl<F> ProgressReporter for OnBytesReporterAdapter<F>
where
    F: Fn(u64) + Send + Sync + 'static,
{
    fn on_bytes(&self, n: u64) {
        (self.0)(n);
    }
}

/// 仅实现「累计进度」的适配器。
pub(crate) struct OnProgressReporterAdapter<F>(pub(crate) F);

impl<F> ProgressReporter for OnProgressReporterAdapter<F>
where
    F: Fn(u64, Option<u64>) + Send + Sync + 'static,
{
    fn on_progress(&self, bytes_done: u64, total: Option<u64>) {
        (self.0)(bytes_done, total);
    }
}

//! 下载控制器测试（内存传输）
//!
//! 测试项：
//! - 分片下载完整性、并发上限、探测只做一次
//! - 暂停：剩余区间与续传状态一致、已下载字节数精确；同一控制器继续、新控制器重启续传都不重复下载
//! - 取消、失败即停、有限重试、续传状态损坏时重新规划
//! - 大小未知 / 不支持 Range 时单连接下载且不可暂停
//! - 已完成跳过、目标文件已存在时落地失败、探测失败

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use reqwest::StatusCode;

use crate::downloader::{
    ByteRange, DownloadController, DownloadError, DownloadResult, DownloadStatus, Downloader,
    JobPaths, ResumeLoad, ResumeStore,
};
use crate::tests::{MemoryTransport, SOURCE_URL, destination_in, exists, sample_data};

const KIB: u64 = 1024;

fn downloader(transport: &MemoryTransport, dest: &std::path::Path) -> Downloader {
    Downloader::new(SOURCE_URL, dest).with_transport(transport.clone())
}

fn read(path: &std::path::Path) -> Vec<u8> {
    std::fs::read(path).unwrap()
}

/// 构建一个在累计写入 `threshold` 字节后自动执行 `action` 的控制器。
fn build_with_trigger(
    builder: Downloader,
    threshold: u64,
    action: fn(&DownloadController),
) -> DownloadController {
    let slot: Arc<OnceLock<DownloadController>> = Arc::new(OnceLock::new());
    let trigger = Arc::clone(&slot);
    let seen = AtomicU64::new(0);
    let fired = AtomicBool::new(false);
    let controller = builder
        .with_on_bytes(move |n| {
            let total = seen.fetch_add(n, Ordering::SeqCst) + n;
            if total >= threshold && !fired.swap(true, Ordering::SeqCst) {
                if let Some(c) = trigger.get() {
                    action(c);
                }
            }
        })
        .build()
        .unwrap();
    slot.set(controller.clone()).unwrap();
    controller
}

// ═══════════════════════════ 分片下载 ═══════════════════════════

#[tokio::test]
async fn chunked_download_completes() {
    let dir = tempfile::tempdir().unwrap();
    let dest = destination_in(&dir);
    let data = sample_data(1024 * 1024 + 123);
    let transport = MemoryTransport::new(data.clone());

    let controller = downloader(&transport, &dest)
        .chunk_size(128 * KIB)
        .connections(4)
        .build()
        .unwrap();
    assert_eq!(controller.status(), DownloadStatus::Init);

    let result = controller.start().await.unwrap();
    assert_eq!(result, DownloadResult::Finished);
    assert_eq!(controller.status(), DownloadStatus::Finished);
    assert_eq!(read(&dest), data.as_ref());

    let paths = controller.paths();
    assert!(!exists(&paths.partial));
    assert!(!exists(&paths.resume));
    assert!(!exists(&paths.resume_tmp()));

    // 9 个区间各请求一次，探测只做一次
    assert_eq!(transport.requests().len(), 9);
    assert_eq!(transport.requested_bytes(), data.len() as u64);
    assert_eq!(transport.head_count(), 1);

    let progress = controller.progress().get_current();
    assert_eq!(progress.bytes_done, data.len() as u64);
    assert_eq!(progress.total, Some(data.len() as u64));
    assert_eq!(controller.remaining_ranges().await.map(|r| r.len()), Some(0));

    // 已完成后再次 start 直接返回
    assert_eq!(controller.start().await.unwrap(), DownloadResult::Finished);
    assert_eq!(transport.requests().len(), 9);
}

#[tokio::test]
async fn probe_runs_once_and_uses_redirected_url() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MemoryTransport::new(sample_data(4096));
    let controller = downloader(&transport, &destination_in(&dir)).build().unwrap();

    let first = controller.probe().await.unwrap();
    let second = controller.probe().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(transport.head_count(), 1);
    assert_eq!(first.resolved_url, crate::tests::RESOLVED_URL);
    assert_eq!(first.size, Some(4096));
    assert!(first.is_resumable());
    assert_eq!(controller.status(), DownloadStatus::Ready);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrency_never_exceeds_connections() {
    let dir = tempfile::tempdir().unwrap();
    let dest = destination_in(&dir);
    let data = sample_data(1024 * 1024);
    let transport = MemoryTransport::new(data.clone()).buffers(8 * 1024, Duration::from_millis(1));

    let result = downloader(&transport, &dest)
        .chunk_size(64 * KIB)
        .connections(3)
        .send()
        .await
        .unwrap();

    assert_eq!(result, DownloadResult::Finished);
    assert_eq!(read(&dest), data.as_ref());
    assert_eq!(transport.requests().len(), 16);
    let peak = transport.max_in_flight();
    assert!(peak >= 1 && peak <= 3, "同时进行的请求数 {peak} 超过上限");
}

// ═══════════════════════════ 暂停与续传 ═══════════════════════════

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn pause_checkpoints_exact_progress() {
    let dir = tempfile::tempdir().unwrap();
    let dest = destination_in(&dir);
    let data = sample_data(2 * 1024 * 1024);
    let total = data.len() as u64;
    let transport = MemoryTransport::new(data.clone()).buffers(16 * 1024, Duration::from_millis(2));

    let builder = downloader(&transport, &dest)
        .chunk_size(256 * KIB)
        .connections(3);
    let controller = build_with_trigger(builder, 700 * KIB, |c| c.pause().unwrap());

    let result = controller.start().await.unwrap();
    assert_eq!(result, DownloadResult::Paused);
    assert_eq!(controller.status(), DownloadStatus::Paused);

    let remaining = controller.remaining_ranges().await.unwrap();
    assert!(!remaining.is_empty());
    assert!(remaining.is_valid_for(total));

    // 写入的字节与记账完全一致：total - 剩余 == 已上报进度
    let done = controller.progress().get_current().bytes_done;
    assert_eq!(total - remaining.total_remaining(), done);

    // 磁盘上的续传状态与内存一致
    let store = ResumeStore::new(controller.paths(), SOURCE_URL, total);
    assert_eq!(store.load().await, ResumeLoad::Found(remaining.clone()));

    // 已记账为完成的字节确实已写入分片文件
    let partial = read(&controller.paths().partial);
    let mut cursor = 0usize;
    for range in &remaining {
        assert_eq!(&partial[cursor..range.start as usize], &data[cursor..range.start as usize]);
        cursor = range.end as usize;
    }
    assert_eq!(&partial[cursor..], &data[cursor..]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn pause_then_start_again_resumes_same_controller() {
    let dir = tempfile::tempdir().unwrap();
    let dest = destination_in(&dir);
    let data = sample_data(1024 * 1024);
    let transport = MemoryTransport::new(data.clone()).buffers(16 * 1024, Duration::from_millis(1));

    let builder = downloader(&transport, &dest)
        .chunk_size(128 * KIB)
        .connections(2);
    let controller = build_with_trigger(builder, 300 * KIB, |c| c.pause().unwrap());

    assert_eq!(controller.start().await.unwrap(), DownloadResult::Paused);
    let remaining = controller.remaining_ranges().await.unwrap();
    let before = transport.requested_bytes();

    assert_eq!(controller.start().await.unwrap(), DownloadResult::Finished);
    assert_eq!(read(&dest), data.as_ref());
    assert_eq!(transport.requested_bytes() - before, remaining.total_remaining());
    assert_eq!(transport.head_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn restart_after_pause_fetches_only_remaining_ranges() {
    let dir = tempfile::tempdir().unwrap();
    let dest = destination_in(&dir);
    let data = sample_data(2 * 1024 * 1024);
    let total = data.len() as u64;

    // 第一个进程：下载到一部分后暂停
    let first = MemoryTransport::new(data.clone()).buffers(16 * 1024, Duration::from_millis(2));
    let builder = downloader(&first, &dest).chunk_size(256 * KIB).connections(4);
    let controller = build_with_trigger(builder, 900 * KIB, |c| c.pause().unwrap());
    assert_eq!(controller.start().await.unwrap(), DownloadResult::Paused);
    let remaining = controller.remaining_ranges().await.unwrap();
    drop(controller);

    // 第二个进程：全新的控制器从续传状态继续
    let second = MemoryTransport::new(data.clone());
    let reported = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&reported);
    let controller = downloader(&second, &dest)
        .chunk_size(256 * KIB)
        .connections(4)
        .with_on_bytes(move |n| {
            counter.fetch_add(n, Ordering::SeqCst);
        })
        .build()
        .unwrap();
    assert_eq!(controller.start().await.unwrap(), DownloadResult::Finished);
    assert_eq!(read(&dest), data.as_ref());

    // 只请求了暂停时剩余的区间，一个字节都没有重复下载
    let mut requested: Vec<ByteRange> = second.requests().into_iter().flatten().collect();
    requested.sort_by_key(|r| r.start);
    assert_eq!(requested.as_slice(), remaining.as_slice());
    assert_eq!(reported.load(Ordering::SeqCst), remaining.total_remaining());
    assert_eq!(controller.progress().get_current().bytes_done, total);
    assert!(!exists(&controller.paths().resume));
}

#[tokio::test]
async fn cancel_keeps_partial_state_and_is_terminal() {
    let dir = tempfile::tempdir().unwrap();
    let dest = destination_in(&dir);
    let data = sample_data(1024 * 1024);
    let transport = MemoryTransport::new(data).buffers(16 * 1024, Duration::from_millis(1));

    let builder = downloader(&transport, &dest)
        .chunk_size(128 * KIB)
        .connections(2);
    let controller = build_with_trigger(builder, 200 * KIB, |c| c.cancel().unwrap());

    assert_eq!(controller.start().await.unwrap(), DownloadResult::Canceled);
    assert_eq!(controller.status(), DownloadStatus::Canceled);

    let paths = controller.paths();
    assert!(exists(&paths.partial));
    assert!(exists(&paths.resume));
    assert!(!exists(&paths.destination));

    assert!(matches!(controller.pause(), Err(DownloadError::NotPausable)));
    assert!(matches!(
        controller.start().await,
        Err(DownloadError::InvalidTransition {
            from: DownloadStatus::Canceled,
            to: DownloadStatus::Running
        })
    ));
}

#[tokio::test]
async fn cancel_before_start_sends_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MemoryTransport::new(sample_data(4096));
    let controller = downloader(&transport, &destination_in(&dir)).build().unwrap();

    controller.cancel().unwrap();
    assert!(controller.start().await.is_err());
    assert_eq!(transport.head_count(), 0);
    assert!(transport.requests().is_empty());
}

// ═══════════════════════════ 失败处理 ═══════════════════════════

#[tokio::test]
async fn chunk_failure_is_fail_fast_and_checkpointed() {
    let dir = tempfile::tempdir().unwrap();
    let dest = destination_in(&dir);
    let data = sample_data(512 * 1024);
    let chunk = 64 * KIB;
    let transport = MemoryTransport::new(data)
        .buffers(8 * 1024, Duration::ZERO)
        .fail_range(2 * chunk, usize::MAX);

    let controller = downloader(&transport, &dest)
        .chunk_size(chunk)
        .connections(2)
        .build()
        .unwrap();

    match controller.start().await {
        Err(DownloadError::ChunkFailed { range, .. }) => {
            assert_eq!(range, ByteRange { start: 2 * chunk, end: 3 * chunk });
        }
        other => panic!("预期 ChunkFailed，得到 {other:?}"),
    }
    assert_eq!(controller.status(), DownloadStatus::Error);
    assert!(controller.last_error().is_some());
    assert!(!exists(&dest));

    // 失败分片已写入的前一半被记账，区间缩短而不是丢弃
    let remaining = controller.remaining_ranges().await.unwrap();
    assert!(remaining.iter().any(|r| *r
        == ByteRange {
            start: 2 * chunk + chunk / 2,
            end: 3 * chunk
        }));
    let store = ResumeStore::new(controller.paths(), SOURCE_URL, 512 * KIB);
    assert_eq!(store.load().await, ResumeLoad::Found(remaining));

    assert!(controller.start().await.is_err(), "Error 是终态");
}

#[tokio::test]
async fn resume_state_write_failure_stops_other_ranges() {
    let dir = tempfile::tempdir().unwrap();
    let dest = destination_in(&dir);
    let chunk = 64 * KIB;
    let transport = MemoryTransport::new(sample_data(8 * chunk as usize));

    // 第一块数据写入时把续传状态文件换成非空目录，之后的记账都会失败
    let resume = JobPaths::for_destination(&dest).resume;
    let broken = AtomicBool::new(false);
    let controller = downloader(&transport, &dest)
        .chunk_size(chunk)
        .connections(1)
        .with_on_bytes(move |_| {
            if !broken.swap(true, Ordering::SeqCst) {
                std::fs::remove_file(&resume).unwrap();
                std::fs::create_dir(&resume).unwrap();
                std::fs::write(resume.join("keep"), b"x").unwrap();
            }
        })
        .build()
        .unwrap();

    assert!(matches!(
        controller.start().await,
        Err(DownloadError::ResumeStateWrite(_))
    ));
    assert_eq!(controller.status(), DownloadStatus::Error);
    assert!(controller.last_error().is_some());
    assert_eq!(transport.requests().len(), 1, "记账失败后不应再请求其他分片");
    assert!(!exists(&dest));
}

#[tokio::test]
async fn retry_requests_only_unwritten_suffix() {
    let dir = tempfile::tempdir().unwrap();
    let dest = destination_in(&dir);
    let data = sample_data(256 * 1024);
    let chunk = 64 * KIB;
    let transport = MemoryTransport::new(data.clone())
        .buffers(8 * 1024, Duration::ZERO)
        .fail_range(chunk, 1);

    let result = downloader(&transport, &dest)
        .chunk_size(chunk)
        .connections(2)
        .max_retries(2)
        .retry_delay_ms(0)
        .send()
        .await
        .unwrap();

    assert_eq!(result, DownloadResult::Finished);
    assert_eq!(read(&dest), data.as_ref());
    let retried = ByteRange {
        start: chunk + chunk / 2,
        end: 2 * chunk,
    };
    assert!(transport.requests().contains(&Some(retried)));
    assert_eq!(transport.requested_bytes(), data.len() as u64 + chunk / 2);
}

#[tokio::test]
async fn corrupt_resume_state_is_replanned() {
    let dir = tempfile::tempdir().unwrap();
    let dest = destination_in(&dir);
    let data = sample_data(300 * 1024);
    let paths = JobPaths::for_destination(&dest);
    std::fs::write(&paths.partial, b"garbage").unwrap();
    std::fs::write(&paths.resume, b"{\"version\": 1, \"url\": ").unwrap();

    let transport = MemoryTransport::new(data.clone());
    let result = downloader(&transport, &dest)
        .chunk_size(100 * KIB)
        .send()
        .await
        .unwrap();

    assert_eq!(result, DownloadResult::Finished);
    assert_eq!(read(&dest), data.as_ref());
    assert_eq!(transport.requested_bytes(), data.len() as u64);
}

#[tokio::test]
async fn resume_state_without_partial_file_is_replanned() {
    let dir = tempfile::tempdir().unwrap();
    let dest = destination_in(&dir);
    let data = sample_data(200 * 1024);
    let paths = JobPaths::for_destination(&dest);
    let store = ResumeStore::new(&paths, SOURCE_URL, data.len() as u64);
    store
        .save(&vec![ByteRange { start: 0, end: 1024 }].into())
        .await
        .unwrap();

    let transport = MemoryTransport::new(data.clone());
    downloader(&transport, &dest).send().await.unwrap();
    assert_eq!(read(&dest), data.as_ref());
    assert_eq!(transport.requested_bytes(), data.len() as u64);
}

#[tokio::test]
async fn finalization_refuses_to_overwrite_destination() {
    let dir = tempfile::tempdir().unwrap();
    let dest = destination_in(&dir);
    let data = sample_data(128 * 1024);
    let paths = JobPaths::for_destination(&dest);
    std::fs::write(&dest, b"existing").unwrap();
    std::fs::write(&paths.partial, b"").unwrap();

    let transport = MemoryTransport::new(data.clone());
    let controller = downloader(&transport, &dest).build().unwrap();
    assert!(matches!(
        controller.start().await,
        Err(DownloadError::FinalizationFailed(_))
    ));
    assert_eq!(controller.status(), DownloadStatus::Error);
    assert_eq!(read(&dest), b"existing");
    assert_eq!(read(&paths.partial), data.as_ref(), "数据完整保留在分片文件中");
}

#[tokio::test]
async fn probe_failure_moves_to_error() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MemoryTransport::new(sample_data(10)).head_status(StatusCode::NOT_FOUND);
    let controller = downloader(&transport, &destination_in(&dir)).build().unwrap();

    assert!(matches!(
        controller.start().await,
        Err(DownloadError::ProbeFailed(_))
    ));
    assert_eq!(controller.status(), DownloadStatus::Error);
    assert!(controller.last_error().unwrap().contains("404"));
    assert!(transport.requests().is_empty());
}

// ═══════════════════════════ 单连接下载 ═══════════════════════════

#[tokio::test]
async fn unknown_length_uses_single_stream_and_is_not_pausable() {
    let dir = tempfile::tempdir().unwrap();
    let dest = destination_in(&dir);
    let data = sample_data(300 * 1024);
    let transport = MemoryTransport::new(data.clone()).without_length();
    let controller = downloader(&transport, &dest).build().unwrap();

    // 尚未探测时不可暂停
    assert!(matches!(controller.pause(), Err(DownloadError::NotPausable)));
    let probe = controller.probe().await.unwrap();
    assert_eq!(probe.size, None);
    assert!(!probe.is_resumable());
    assert!(matches!(controller.pause(), Err(DownloadError::NotPausable)));
    assert_eq!(controller.status(), DownloadStatus::Ready);

    assert_eq!(controller.start().await.unwrap(), DownloadResult::Finished);
    assert_eq!(read(&dest), data.as_ref());
    assert_eq!(transport.requests(), vec![None]);
    assert!(!exists(&controller.paths().resume));
    assert!(controller.remaining_ranges().await.is_none());
    assert_eq!(
        controller.progress().get_current().bytes_done,
        data.len() as u64
    );
}

#[tokio::test]
async fn no_range_support_uses_single_stream() {
    let dir = tempfile::tempdir().unwrap();
    let dest = destination_in(&dir);
    let data = sample_data(200 * 1024);
    let transport = MemoryTransport::new(data.clone()).without_ranges();
    let controller = downloader(&transport, &dest).connections(8).build().unwrap();

    controller.probe().await.unwrap();
    assert!(matches!(controller.pause(), Err(DownloadError::NotPausable)));
    assert_eq!(controller.start().await.unwrap(), DownloadResult::Finished);
    assert_eq!(read(&dest), data.as_ref());
    assert_eq!(transport.requests(), vec![None]);
}

#[tokio::test]
async fn single_stream_can_be_canceled() {
    let dir = tempfile::tempdir().unwrap();
    let dest = destination_in(&dir);
    let transport = MemoryTransport::new(sample_data(512 * 1024))
        .without_length()
        .buffers(16 * 1024, Duration::from_millis(1));
    let builder = downloader(&transport, &dest);
    let controller = build_with_trigger(builder, 100 * KIB, |c| c.cancel().unwrap());

    assert_eq!(controller.start().await.unwrap(), DownloadResult::Canceled);
    assert!(!exists(&dest));
    assert!(!exists(&controller.paths().resume));
}

// ═══════════════════════════ 已完成 / 配置 ═══════════════════════════

#[tokio::test]
async fn already_complete_skips_network() {
    let dir = tempfile::tempdir().unwrap();
    let dest = destination_in(&dir);
    std::fs::write(&dest, b"done before").unwrap();

    let transport = MemoryTransport::new(sample_data(1024));
    let controller = downloader(&transport, &dest).build().unwrap();
    assert_eq!(controller.start().await.unwrap(), DownloadResult::Finished);
    assert_eq!(controller.status(), DownloadStatus::Finished);
    assert_eq!(transport.head_count(), 0);
    assert!(transport.requests().is_empty());
    assert_eq!(read(&dest), b"done before");
}

#[tokio::test]
async fn empty_resource_finishes_with_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    let dest = destination_in(&dir);
    let transport = MemoryTransport::new(bytes::Bytes::new());

    assert_eq!(
        downloader(&transport, &dest).send().await.unwrap(),
        DownloadResult::Finished
    );
    assert_eq!(read(&dest), b"");
    assert!(transport.requests().is_empty());
}

#[test]
fn invalid_config_is_rejected() {
    let transport = MemoryTransport::new(sample_data(1));
    for builder in [
        downloader(&transport, "x.bin".as_ref()).chunk_size(0),
        downloader(&transport, "x.bin".as_ref()).connections(0),
        downloader(&transport, "x.bin".as_ref()).connections(usize::MAX),
        downloader(&transport, "x.bin".as_ref())
            .connections(tokio::sync::Semaphore::MAX_PERMITS + 1),
        downloader(&transport, "x.bin".as_ref()).request_timeout(Some(Duration::ZERO)),
    ] {
        assert!(matches!(builder.build(), Err(DownloadError::InvalidConfig(_))));
    }
}

#[tokio::test]
async fn status_watcher_observes_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MemoryTransport::new(sample_data(64 * 1024));
    let controller = downloader(&transport, &destination_in(&dir)).build().unwrap();

    let mut watcher = controller.watch_status();
    let collector = tokio::spawn(async move {
        let mut seen = Vec::new();
        while let Ok(status) = watcher.changed().await {
            seen.push(status);
            if status.is_terminal() {
                break;
            }
        }
        seen
    });

    controller.start().await.unwrap();
    let seen = collector.await.unwrap();
    // 中间状态可能被合并，但最终一定观察到终态
    assert_eq!(seen.last(), Some(&DownloadStatus::Finished));
}

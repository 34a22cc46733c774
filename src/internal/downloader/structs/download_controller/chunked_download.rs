mod chunk_handler;
mod chunked;
mod download_one_range;
mod range_request;
mod resume;
mod spawn_tasks;

pub(super) use chunked::{RunChunkedDownloadParams, run_chunked_download};
pub(super) use resume::{PrepareLedgerParams, prepare_ledger};

//! 从 URL 推断本地文件名。

use percent_encoding::percent_decode_str;
use url::Url;

use crate::internal::downloader::structs::download_error::DownloadError;

/// 取 URL 路径最后一段并做百分号解码，例如
/// `https://host/dir/my%20file.zip?x=1` 得到 `my file.zip`。
///
/// 路径为空、以 `/` 结尾、或解码后不是合法的单段文件名时返回 [`DownloadError::NoFileName`]。
pub fn infer_file_name(url: &str) -> Result<String, DownloadError> {
    let parsed =
        Url::parse(url).map_err(|e| DownloadError::NoFileName(format!("{url}: {e}")))?;
    let segment = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();
    let name = percent_decode_str(segment).decode_utf8_lossy();
    let name = name.trim();
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(DownloadError::NoFileName(url.to_string()));
    }
    Ok(name.to_string())
}

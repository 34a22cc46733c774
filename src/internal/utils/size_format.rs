const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

/// 以 1024 为进制格式化字节数，保留两位小数，例如 `1536` → `1.50 KB`。
pub fn human_readable_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{size:.2} {}", UNITS[unit])
}

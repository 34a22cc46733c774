/// 内部导出的模块
mod internal;


/// 导出常用工具函数
pub use internal::utils::file_name::infer_file_name;
pub use internal::utils::size_format::human_readable_size;

/// HTTP 传输接口与默认的 reqwest 实现；自定义传输时实现 [`transport::HttpTransport`]
pub mod transport {
    use crate::internal;
    pub use internal::transport::structs::*;
    pub use internal::transport::traits::http_transport::*;
}

pub mod states {
    pub mod unlock_reactive {
        use crate::internal;
        pub use internal::states::unlock_reactive::*;
    }
}

pub mod downloader {
    use crate::internal;
    // 下载器：类型与入口（以 lib 为中心，此处统一导出）
    pub use internal::downloader::structs::*;
    pub use internal::downloader::structs::downloader_config::{
        DEFAULT_CHUNK_SIZE, DEFAULT_CONNECT_TIMEOUT, DEFAULT_CONNECTIONS, DEFAULT_MAX_RETRIES,
        DEFAULT_REQUEST_TIMEOUT, DEFAULT_RETRY_DELAY_MS, DEFAULT_USER_AGENT,
    };
    pub use internal::downloader::traits::progress::*;
}

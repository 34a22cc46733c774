//! HTTP 传输层：下载引擎只依赖 [`traits::http_transport::HttpTransport`]，
//! 生产环境使用 reqwest 实现，测试中可替换为内存实现。

pub mod structs;
pub mod traits;

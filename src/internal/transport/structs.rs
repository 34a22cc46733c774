pub mod reqwest_transport;
pub mod timeouts;
pub mod transport_error;

// 重导出公共类型
pub use reqwest_transport::ReqwestTransport;
pub use transport_error::TransportError;

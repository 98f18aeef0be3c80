pub mod http_client;
pub mod in_memory_http;

pub use http_client::ReqwestHttp;
pub use in_memory_http::InMemoryHttp;

pub mod blob;
pub mod http;

pub mod capture;
pub mod client;
pub mod types;

pub use client::{HttpSender, ReqwestSender};
pub use types::{HttpExchange, HttpHeader, HttpRequest, HttpResponse, ParamSelector};

pub mod rate_limited;
pub mod retry;
pub mod transport;

pub use rate_limited::{RateLimitedClient, RequestOptions};
pub use transport::{ReqwestTransport, Transport};

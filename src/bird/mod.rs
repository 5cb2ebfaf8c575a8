pub mod scanner;
pub mod session;

pub use session::query_peers;

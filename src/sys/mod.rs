pub mod fetch;
pub mod runtime;
pub mod server;

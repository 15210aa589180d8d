pub mod handler;
pub mod protocol;
pub mod server;
pub mod tools;

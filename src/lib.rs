pub mod category;
pub mod config;
pub mod filename;
pub mod identity;
pub mod logger;
pub mod publisher;
pub mod server;
pub mod store;
pub mod submission;
pub mod text_utils;
mod test_data;
#[cfg(test)]
mod test_server;

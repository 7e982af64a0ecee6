pub mod context;
pub mod producer;
pub mod publisher;

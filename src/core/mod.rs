pub mod bridge;
pub mod chunker;
pub mod config;
pub mod guard;
pub mod lifecycle;
pub mod presenter;
pub mod resolver;
pub mod terminal;
pub mod workflow;

pub mod config;
pub mod db;
pub mod llm;
pub mod pipeline;
pub mod rate_limit;
pub mod util;
pub mod web;

pub mod commands;
pub mod context;
pub mod dispatch;
pub mod env;
pub mod evaluate;
pub mod list;
pub mod output;
pub mod runtime;

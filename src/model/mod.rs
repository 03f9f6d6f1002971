pub mod config;
pub mod task;
pub mod view;

pub use config::*;
pub use task::*;
pub use view::*;

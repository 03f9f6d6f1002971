pub mod app;
pub mod cli {
    pub mod commands;
    pub mod handlers;
    pub mod output;
    pub mod shell;
}
pub mod io {
    pub mod config_io;
    pub mod persist;
    pub mod storage;
}
pub mod model;
pub mod ops {
    pub mod history;
    pub mod query;
    pub mod stats;
    pub mod task_ops;
    pub mod transfer;
}
pub mod util {
    pub mod timing;
    pub mod unicode;
}

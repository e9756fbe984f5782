pub mod lock;
pub mod run_dir;
pub mod snapshots;

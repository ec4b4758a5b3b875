pub mod config;
pub mod data_dir;
pub mod fd_limit;
pub mod logger;
pub mod tempfiles;
pub mod urlaudit_toml;

pub use config::*;
pub use data_dir::{absolutize, choose_data_dir, resolve_data_dir};
pub use fd_limit::{FDS_PER_WORKER, cap_workers, max_open_fds, max_workers_by_fd_limit};
pub use logger::{Colors, setup_logging};
pub use tempfiles::{prepare_data_dir, rename_temp_to_final, result_paths, temp_path_for};

pub mod path_base;
pub mod service;
pub mod static_files;

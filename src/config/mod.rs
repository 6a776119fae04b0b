pub mod proc_loader;
pub mod settings;
pub mod token;
pub mod types;

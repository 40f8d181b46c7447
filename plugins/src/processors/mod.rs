pub mod role_file;

pub use role_file::RoleFileInjector;

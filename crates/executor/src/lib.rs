pub mod shell;

pub use shell::ShellExecutor;

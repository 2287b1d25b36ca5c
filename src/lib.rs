// Core infrastructure modules
pub mod config;
pub mod core;

// Interactive shell
pub mod repl;
pub mod session;

#[cfg(test)]
pub(crate) mod test_utils;

/// Command list replay: executor, render pass emulation, transfers

pub mod executor;
mod render_pass_emulation;
mod transfer;

pub use executor::execute;

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;

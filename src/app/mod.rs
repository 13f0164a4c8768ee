mod context;
mod orchestrator;
mod runtime;
mod startup;

#[cfg(test)]
mod tests;

pub use context::AppContext;
pub use orchestrator::MingoApp;

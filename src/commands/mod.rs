// Commands module - mutating operations on the application state
// Each command mutates the collection, then persists locally and pushes the affected dates

pub mod settings;
pub mod task;
pub mod transfer;

pub use settings::FilterInput;
pub use task::TaskInput;

pub mod handlers;
pub mod models;
pub mod state;

pub use models::{Chore, UserSnapshot};
pub use state::{resolve, ChoreAction, ChoreStatus};

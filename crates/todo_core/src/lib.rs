pub mod clock;
pub mod config;
pub mod error;
pub mod model;
pub mod seed;
pub mod storage;
pub mod store;
pub mod view;

pub use error::AppError;
pub use model::{Priority, Task, TaskDraft, TaskPatch};
pub use store::{InitError, InitOutcome, SubscriptionId, TaskStore};
pub use view::{SortOrder, StatusFilter, TaskStats, ViewSettings, project};

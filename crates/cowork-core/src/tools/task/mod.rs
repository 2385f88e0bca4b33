//! Task management: the persistent Tasks ToolSet and the ephemeral
//! Todo ToolSet.

mod store;
mod tasks;
mod todo;

pub use store::{EffectiveStatus, Priority, Status, Task, TaskStore};
pub use tasks::TasksToolSet;
pub use todo::{Todo, TodoStatus, TodoToolSet};

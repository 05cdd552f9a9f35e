// The core module contains all business logic.
// Nothing in here knows about HTTP, Google APIs or the chat wire format;
// those live behind the ports in `documents` and `ai`.

#[path = "ai/mod.rs"]
pub mod ai;

#[path = "forms/mod.rs"]
pub mod forms;

#[path = "documents/mod.rs"]
pub mod documents;

#[path = "dispatch/form_router.rs"]
pub mod dispatch;

#[path = "tasks.rs"]
pub mod tasks;

#[cfg(test)]
#[path = "test_support.rs"]
pub mod test_support;

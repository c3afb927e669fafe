//! Task book, date rules and calendar projection behind the Daybook task
//! tracker. Storage and drawing are ports; the browser front end supplies
//! `localStorage` and a month grid.

pub mod book;
pub mod calendar;
pub mod config;
pub mod datetime;
pub mod filter;
pub mod navigation;
pub mod picker;
pub mod storage;
pub mod store;
pub mod task;
pub mod view;

pub use book::{
  EditError,
  TaskBook,
  TaskEdit
};
pub use config::Config;
pub use filter::Filter;
pub use storage::{
  MemoryStorage,
  Storage,
  StorageError
};
pub use store::{
  PendingWrite,
  TaskStore,
  WriteOutcome
};
pub use task::{
  DateField,
  Task
};

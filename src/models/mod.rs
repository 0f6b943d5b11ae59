pub mod event;

pub use event::{ChangeEvent, FileOp};

pub mod buffer;
pub mod events;
pub mod inspector;
pub mod manager;
pub mod multi_session;
pub mod persistence;
pub mod session;
pub mod state;

pub use buffer::{OutputBuffer, OutputRecord, OutputStream};
pub use events::{EventKind, EventQueue, EventRecord};
pub use manager::SessionManager;
pub use multi_session::{ChildSession, MultiSessionManager};
pub use session::{DebugSession, SessionMode};
pub use state::{Breakpoint, DebugState, SessionState, StopContext, StopReason, WatchExpression};

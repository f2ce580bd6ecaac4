//! Extension host core for Krill.
//!
//! Everything a terminal coding-agent shell needs to let independently
//! authored extensions observe and shape a session:
//!
//! - [`session`] - branching, append-only entry log with fork/switch and
//!   custom-entry replay
//! - [`events`] - typed hook bus with veto, transform, and notification
//!   dispatch semantics
//! - [`tools`] - registry and execution contract for cancellable,
//!   progress-streaming tools
//! - [`ui`] - cooperative modal surface contract and the host UI handle
//! - [`extension`] - the registration surface and the host that wires
//!   it all together
//!
//! The crate owns no terminal, no transport, and no persistence format;
//! those belong to the embedding shell.

pub mod context;
pub mod events;
pub mod extension;
pub mod session;
pub mod tools;
pub mod ui;

pub use context::{ContextUsage, HostContext, SessionView};
pub use events::{EventBus, EventHandler, EventType, HookEvent, HookOutcome};
pub use extension::{Command, CustomEntryHandle, Extension, ExtensionApi, ExtensionHost};
pub use session::{Entry, EntryId, EntryKind, EntryStore, SessionError};
pub use tools::{ProgressSender, Tool, ToolRegistry, ToolResult};
pub use ui::{ModalSession, Surface, Theme, UiHandle};

pub mod client;
pub mod composer;
pub mod config;
pub mod dispatcher;
pub mod endpoint;
pub mod error;
pub mod history;
pub mod host;
pub mod prefs;
pub mod reply;
pub mod request;
pub mod session;
pub mod state;

// Re-export main types for convenience
pub use client::ChatClient;
pub use composer::Composer;
pub use config::Config;
pub use dispatcher::{Dispatcher, PendingReply, Reply};
pub use error::DispatchError;
pub use history::QueryHistory;
pub use host::{HostEnvironment, StaticHost};
pub use prefs::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore, PrefsError};
pub use request::{Mode, Operation, SendRequest, Submission};
pub use session::{ApiVersion, Model, SessionState};
pub use state::{Attachment, ChatState, Message, ScrollRequest, Sender, Transcript};

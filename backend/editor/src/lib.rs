//! Editor session core for mdforge.
//!
//! [`EditorStore`] owns one editor's document, selection, history and
//! interaction state. The remaining modules cover what runs around it:
//! comment anchoring, debounced notifications, in-flight guards for host
//! callbacks, and image upload placeholders.

pub mod comments;
pub mod debounce;
pub mod events;
pub mod history;
pub mod inflight;
pub mod notify;
pub mod state;
pub mod store;
pub mod transaction;
pub mod upload;

pub use comments::{CommentHandler, CommentList, CommentSession};
pub use debounce::Debouncer;
pub use events::{EditorEvent, EventBus};
pub use history::{History, Snapshot};
pub use inflight::{InFlight, InFlightToken};
pub use notify::watch_markdown;
pub use state::EditorState;
pub use store::{EditorOptions, EditorStore};
pub use transaction::Transaction;
pub use upload::{upload_image, ImageUploader, UploadFile, UploadTicket};

pub mod actors;
pub mod comment;
pub mod config;
pub mod journal;
pub mod registry;
pub mod store;
pub mod util;

pub use comment::{Comment, CommentError, CommentId, CommentSource, CommentType};
pub use registry::{EntityRef, EntityRegistry, HostRef, ServiceRef};
pub use store::CommentStore;

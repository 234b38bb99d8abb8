//! Domain layer: the settings tree and its document format
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

mod arena;
pub mod bundle;
pub mod document;
pub mod entry;
pub mod entry_type;
pub mod error;
pub mod group;
pub mod identifier;
pub mod node;

pub use bundle::Bundle;
pub use entry::Entry;
pub use entry_type::{EntryType, EntryValue};
pub use error::{SettingsError, SettingsResult};
pub use group::Group;
pub use node::{Node, NodeMut, NodeRef};

pub mod browser;
pub mod core;
pub mod dom;
pub mod errors;
pub mod marker;
pub mod testing;
pub mod types;
pub mod utils;

pub use browser::MarkingSession;
#[cfg(feature = "chrome")]
pub use browser::ChromeBrowser;
pub use crate::core::{BrowserTrait, Config, Document, MarkerConfig, NodeId};
pub use dom::PageSnapshot;
pub use errors::{MarkerError, Result};
pub use marker::{find_marked, mark_elements, remove_overlays, Scanner};
pub use types::*;

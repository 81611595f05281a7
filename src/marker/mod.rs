pub mod cleanup;
pub mod label;
pub mod overlay;
pub mod priority;
pub mod resolver;
pub mod scanner;

pub use cleanup::remove_overlays;
pub use label::{find_marked, ACCESSIBLE_NAME};
pub use priority::Priority;
pub use resolver::{AcceptedSet, Resolution};
pub use scanner::{mark_elements, Scanner};

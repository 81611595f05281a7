pub mod browser;
pub mod config;
pub mod document;

pub use browser::BrowserTrait;
pub use config::{BrowserConfig, Config, MarkerConfig, SessionConfig, Viewport};
pub use document::{ClientRect, ComputedStyle, Document, NodeId, OverlayNode};

pub mod javascript;
pub mod scripts;

pub use javascript::JavaScriptRunner;
pub use scripts::{ReplayReport, ReplayRequest, FILE_CHOOSER_OVERRIDE, FRAMES_SCRIPT};

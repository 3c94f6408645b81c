//! Shared widget chrome.

pub mod collapsible;
pub mod pose_edit;

pub use collapsible::CollapsibleSection;
pub use pose_edit::pose_edit;

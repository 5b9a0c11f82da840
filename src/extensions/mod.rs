//! Optional extensions to the base controller.

pub mod cursor_feedback;
#[cfg(feature = "extension_probe_gizmos")]
pub mod probe_gizmos;

//! Optional extensions to the base camera controller.

#[cfg(feature = "extension_look_tracking")]
pub mod look_tracking;

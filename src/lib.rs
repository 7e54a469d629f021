//! segoeui-patch
pub mod core;
pub mod font_source;
pub mod logging;
pub mod patch;

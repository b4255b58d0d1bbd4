//! `twinkly` streams pixel animations to Twinkly-class addressable LED devices over their
//! HTTP and UDP interfaces, and can drive a grid of them as one larger surface.
//!
//! # Structure
//!
//! * [color]: color variants with white and amber channels, fading and blending
//! * [frame]: pixel grids, geometry, drawing and image interop
//! * [sequence]: ordered frame collections, transitions and playback
//! * [device]: single device client, device arrays and discovery
//! * [models]: configuration file model

#[macro_use]
extern crate tracing;

pub mod color;
pub mod device;
pub mod frame;
pub mod models;
pub mod sequence;

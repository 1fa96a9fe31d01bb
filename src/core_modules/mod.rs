// The stages of the framing pipeline, in data-flow order, plus their shared types.

pub mod pixel;
pub mod point;

pub mod frame_sampler;
pub mod motion_detector;
pub mod spatial_aggregator;
pub mod focus_resolver;
pub mod zoom_resolver;
pub mod viewport;
pub mod state_store;

pub mod audio;
pub mod debug_view;

//! Stratum is a retained-mode scene-graph compositor.
//!
//! A [`Root`] owns a tree of styled nodes. Style mutations raise per-node dirty levels and
//! release exactly the cached composites they invalidate; the next [`Root::draw`] regenerates
//! those composites bottom-up and draws the flattened tree as batched textured quads:
//!
//! - Build nodes with [`Root::create_node`] and link them with [`Root::append_child`]
//! - Mutate them through [`Root::update_style`]
//! - Draw with [`Root::draw`] and read the frame back with [`Root::read_pixels`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]
// Some internal accessors only serve tests and the CLI.
#![allow(dead_code)]

mod foundation;

pub(crate) mod cache;
pub(crate) mod composite;
pub(crate) mod filter;
pub(crate) mod refresh;
pub(crate) mod render;
pub(crate) mod root;
pub(crate) mod scene;
pub(crate) mod style;

pub use crate::foundation::core::{
    Affine, BezPath, Canvas, Color, IRect, Point, Rect, Rgba8Premul, Vec2,
};
pub use crate::foundation::error::{StratumError, StratumResult};
pub use crate::foundation::ids::{NodeId, TextureId};

pub use crate::cache::shared::SharedStats;
pub use crate::composite::NodeTexture;
pub use crate::composite::merge::MergeStats;
pub use crate::filter::{MAX_BLUR_SIGMA, MAX_MOTION_DISTANCE, RADIAL_CENTER_RANGE};
pub use crate::render::backend::{
    Axis, BackendKind, BackendStats, FrameRGBA, GpuBackend, Program, Target, create_backend,
};
pub use crate::render::batch::{PRIMITIVE_RESTART, QuadBatch};
pub use crate::render::cpu::{CpuBackend, CpuBackendOpts};
pub use crate::render::frame::FrameStats;
pub use crate::render::surface_pool::SurfacePoolOpts;
pub use crate::root::{CacheState, FrameReport, RenderEvent, Root, RootOpts, RootStats};
pub use crate::scene::content::{
    Bitmap, CanvasSource, Content, DecodedFrame, FrameProvider, ImageSource, VideoSource,
};
pub use crate::scene::model::{ContentDef, NodeDef, SceneDef};
pub use crate::scene::node::{FrameCallback, FrameSignal};
pub use crate::scene::structure::StructEntry;
pub use crate::style::computed::{
    BlendMode, ComputedStyle, MaskMode, ObjectFit, Overflow, StyleChange, StyleKey,
};
pub use crate::style::filter::Filter;
pub use crate::style::level::{RefreshLevel, level_for_key};

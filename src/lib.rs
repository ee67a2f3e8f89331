//! Textblur renders a text label that animates smoothly between sharp and blurred.
//!
//! Animating a live Gaussian blur every frame is expensive, so the label precomputes a short
//! ladder of blur stages once per content change and cross-dissolves between adjacent stages
//! while the animation runs.
//!
//! # Pipeline overview
//!
//! 1. **Rasterize**: `StyledText + bounds -> Bitmap` via a [`TextRasterizer`] ([`ParleyRasterizer`])
//! 2. **Generate**: `Bitmap -> StageSet` (blur each stage, composite onto an opaque backdrop) on a
//!    background rayon pool, handed back through a single-slot channel
//! 3. **Animate**: [`AnimationDriver`] maps frame time to a pair of adjacent stages
//! 4. **Display**: the pair lands on a two-layer [`LayerStack`]
//!
//! [`TextBlurController`] ties the steps together and owns the request queue that parks blur
//! requests until the stages are ready.
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Single foreground owner**: only stage generation leaves the owning thread; results are
//!   accepted by token so a superseded run can never replace newer stages.
//! - **Premultiplied RGBA8** end-to-end.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod animation;
mod config;
mod effects;
mod foundation;
mod label;
mod stages;
mod text;

pub use animation::clock::{FrameClock, ManualClock, SystemClock};
pub use animation::driver::{AnimationDriver, BlendFrame, Completion, DriverState, FrameStep};
pub use config::{BlurParameters, LabelOptions};
pub use effects::blur::{BlurPrimitive, GaussianBlur};
pub use effects::composite::{composite_atop, crossfade_bitmaps};
pub use foundation::core::{Bitmap, Rgba8, Rgba8Premul, Size};
pub use foundation::error::{TextBlurError, TextBlurResult};
pub use label::controller::TextBlurController;
pub use label::layers::{ImageLayer, LayerStack};
pub use label::request::{DeferredRequest, RequestQueue};
pub use stages::cache::{GenerationToken, StageCache};
pub use stages::generator::StageGenerator;
pub use stages::set::StageSet;
pub use text::layout::ParleyRasterizer;
pub use text::rasterizer::{
    Font, LineBreakMode, RasterizedText, StyledText, TextAlignment, TextRasterizer, TextStyle,
};

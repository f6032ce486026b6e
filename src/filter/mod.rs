//! Filter chains as ordered, tiled GPU passes.

pub(crate) mod bloom;
pub(crate) mod blur;
pub(crate) mod color;
pub(crate) mod motion;
pub(crate) mod radial;
pub(crate) mod tiled;

use crate::cache::texture::TextureCache;
use crate::foundation::core::{IRect, Point, Rect};
use crate::foundation::error::StratumResult;
use crate::foundation::ids::TextureId;
use crate::render::resources::Resources;
use crate::style::computed::ComputedStyle;
use crate::style::filter::Filter;

/// Largest blur or bloom sigma a pass runs with; larger values are clamped.
pub const MAX_BLUR_SIGMA: f32 = 256.0;
/// Largest motion blur distance a pass runs with; larger values are clamped.
pub const MAX_MOTION_DISTANCE: f32 = 1024.0;
/// Radial blur centers are clamped to this range of node-box fractions.
pub const RADIAL_CENTER_RANGE: (f32, f32) = (-1.0, 2.0);

/// `v` clamped to `[0, max]`; NaN reads as zero.
fn bounded(v: f32, max: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, max) }
}

/// One pass of a normalized chain.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum PassFx {
    Blur { sigma: f32 },
    Motion { dx: f32, dy: f32 },
    Radial { center: Point, strength: f32 },
    Bloom { threshold: f32, sigma: f32, strength: f32 },
    Color([f32; 20]),
}

impl PassFx {
    /// Region the pass can write given the region its input covers.
    pub(crate) fn out_region(&self, input: IRect) -> IRect {
        match self {
            Self::Color(_) => input,
            Self::Blur { sigma } => {
                let s = blur::spread(*sigma);
                input.inflate(s, s)
            }
            Self::Motion { dx, dy } => {
                let (sx, sy) = motion::spread(*dx, *dy);
                input.inflate(sx, sy)
            }
            Self::Radial { center, strength } => radial::out_region(input, *center, *strength),
            Self::Bloom { sigma, .. } => {
                let s = bloom::spread(*sigma);
                input.inflate(s, s)
            }
        }
    }

    /// Input region an output tile depends on, before grid alignment.
    pub(crate) fn scratch_region(&self, tile: IRect) -> IRect {
        match self {
            Self::Color(_) => tile,
            Self::Blur { sigma } => {
                let s = blur::support(*sigma);
                tile.inflate(s, s)
            }
            Self::Motion { dx, dy } => {
                let (sx, sy) = motion::support(*dx, *dy);
                tile.inflate(sx, sy)
            }
            Self::Radial { center, strength } => radial::scratch_region(tile, *center, *strength),
            Self::Bloom { sigma, .. } => {
                let s = bloom::support(*sigma);
                tile.inflate(s, s)
            }
        }
    }

    /// Scratch origins snap to multiples of this so downsampling grids agree across tiles.
    pub(crate) fn align(&self) -> i32 {
        match self {
            Self::Blur { sigma } => 1 << blur::kawase_steps(*sigma),
            Self::Bloom { sigma, .. } => 1 << bloom::levels(*sigma),
            _ => 1,
        }
    }

    /// Run the pass over a scratch texture covering `region`; the result replaces its contents.
    pub(crate) fn run(&self, res: &mut Resources, tex: TextureId, region: IRect) -> StratumResult<()> {
        let (w, h) = (region.width(), region.height());
        match self {
            Self::Blur { sigma } => blur::run(res, tex, w, h, *sigma),
            Self::Motion { dx, dy } => motion::run(res, tex, *dx, *dy),
            Self::Radial { center, strength } => radial::run(res, tex, region, *center, *strength),
            Self::Bloom {
                threshold,
                sigma,
                strength,
            } => bloom::run(res, tex, w, h, *threshold, *sigma, *strength),
            Self::Color(m) => color::run(res, tex, *m),
        }
    }
}

/// Normalized chain: identity filters dropped, adjacent color adjustments folded, parameters
/// clamped to the ranges a pass can run with.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct FilterPipeline {
    pub(crate) passes: Vec<PassFx>,
}

/// Build the pass list for a node whose content box is `bbox`.
pub(crate) fn normalize_filters(filters: &[Filter], bbox: Rect) -> FilterPipeline {
    let mut passes = Vec::<PassFx>::new();
    let mut pending: Option<[f32; 20]> = None;

    let flush_color = |pending: &mut Option<[f32; 20]>, passes: &mut Vec<PassFx>| {
        if let Some(m) = pending.take()
            && !color::is_identity(&m)
        {
            passes.push(PassFx::Color(m));
        }
    };

    for f in filters {
        if f.is_identity() {
            continue;
        }
        if let Some(m) = color::matrix_for(f) {
            pending = Some(match pending {
                Some(acc) => color::compose(&m, &acc),
                None => m,
            });
            continue;
        }
        flush_color(&mut pending, &mut passes);
        match *f {
            Filter::Blur { sigma } => passes.push(PassFx::Blur {
                sigma: bounded(sigma, MAX_BLUR_SIGMA),
            }),
            Filter::MotionBlur { angle, distance } => {
                let distance = bounded(distance, MAX_MOTION_DISTANCE);
                let angle = if angle.is_finite() { angle } else { 0.0 };
                let (sin, cos) = angle.to_radians().sin_cos();
                passes.push(PassFx::Motion {
                    dx: cos * distance,
                    dy: sin * distance,
                });
            }
            Filter::RadialBlur { center, strength } => {
                let (lo, hi) = RADIAL_CENTER_RANGE;
                let [cx, cy] = center.map(|c| if c.is_finite() { c.clamp(lo, hi) } else { 0.5 });
                passes.push(PassFx::Radial {
                    center: Point::new(
                        bbox.x0 + f64::from(cx) * bbox.width(),
                        bbox.y0 + f64::from(cy) * bbox.height(),
                    ),
                    strength: bounded(strength, 0.9),
                });
            }
            Filter::Bloom {
                threshold,
                sigma,
                strength,
            } => passes.push(PassFx::Bloom {
                threshold: bounded(threshold, 1.0),
                sigma: bounded(sigma, MAX_BLUR_SIGMA),
                strength: bounded(strength, f32::MAX),
            }),
            _ => {}
        }
    }
    flush_color(&mut pending, &mut passes);
    FilterPipeline { passes }
}

/// Return `true` when the chain leaves at least one pass after normalization.
pub(crate) fn emits_passes(filters: &[Filter]) -> bool {
    !normalize_filters(filters, Rect::ZERO).passes.is_empty()
}

/// Content box expanded by every pass's spread.
pub(crate) fn expand_bbox(style: &ComputedStyle, bbox: Rect) -> Rect {
    let pipeline = normalize_filters(&style.filters, bbox);
    if pipeline.passes.is_empty() {
        return bbox;
    }
    let mut r = IRect::round_out(bbox);
    for pass in &pipeline.passes {
        r = pass.out_region(r);
    }
    r.to_rect().union(bbox)
}

/// Describe what is wrong with a filter's parameters, if anything.
pub(crate) fn problem(f: &Filter) -> Option<String> {
    let finite_nonneg = |v: f32| v.is_finite() && v >= 0.0;
    let (lo, hi) = RADIAL_CENTER_RANGE;
    match *f {
        Filter::Blur { sigma } if !(0.0..=MAX_BLUR_SIGMA).contains(&sigma) => Some(format!(
            "blur sigma must be in [0, {MAX_BLUR_SIGMA}]"
        )),
        Filter::MotionBlur { angle, distance }
            if !angle.is_finite() || !(0.0..=MAX_MOTION_DISTANCE).contains(&distance) =>
        {
            Some(format!(
                "motion blur needs a finite angle and a distance in [0, {MAX_MOTION_DISTANCE}]"
            ))
        }
        Filter::RadialBlur { center, strength }
            if !center.iter().all(|c| (lo..=hi).contains(c)) || !(0.0..=0.9).contains(&strength) =>
        {
            Some(format!(
                "radial blur center must be in [{lo}, {hi}] and strength in [0, 0.9]"
            ))
        }
        Filter::Bloom {
            threshold,
            sigma,
            strength,
        } if !(0.0..=1.0).contains(&threshold)
            || !(0.0..=MAX_BLUR_SIGMA).contains(&sigma)
            || !finite_nonneg(strength) =>
        {
            Some(format!(
                "bloom threshold must be in [0, 1], sigma in [0, {MAX_BLUR_SIGMA}] and strength >= 0"
            ))
        }
        Filter::Brightness { amount } if !(-1.0..=1.0).contains(&amount) => {
            Some("brightness must be in [-1, 1]".to_owned())
        }
        Filter::HueRotate { degrees } if !degrees.is_finite() => {
            Some("hue rotation must be finite".to_owned())
        }
        Filter::Saturate { amount } | Filter::Contrast { amount } if !finite_nonneg(amount) => {
            Some("saturate/contrast must be finite and >= 0".to_owned())
        }
        Filter::Sepia { amount } | Filter::Grayscale { amount } | Filter::Invert { amount }
            if !(0.0..=1.0).contains(&amount) =>
        {
            Some("sepia/grayscale/invert must be in [0, 1]".to_owned())
        }
        _ => None,
    }
}

/// Run the node's filter chain over `src`.
#[tracing::instrument(skip_all, fields(passes))]
pub(crate) fn apply_chain(
    res: &mut Resources,
    src: &TextureCache,
    style: &ComputedStyle,
    bbox: Rect,
) -> StratumResult<TextureCache> {
    let pipeline = normalize_filters(&style.filters, bbox);
    tracing::Span::current().record("passes", pipeline.passes.len());

    let mut current: Option<TextureCache> = None;
    for pass in &pipeline.passes {
        let input = current.as_ref().unwrap_or(src);
        let out = tiled::run_tiled(res, input, pass)?;
        current = Some(out);
    }
    Ok(current.unwrap_or_else(|| TextureCache::owned(Vec::new(), &res.release)))
}

#[cfg(test)]
#[path = "../../tests/unit/filter/mod.rs"]
mod tests;

use crate::cache::texture::SubTexture;
use crate::foundation::core::{Affine, BezPath, IRect};
use crate::foundation::error::{StratumError, StratumResult};
use crate::render::backend::GpuBackend;
use crate::scene::content::{Bitmap, Content};
use crate::style::computed::{ComputedStyle, ObjectFit};
use std::sync::Arc;

pub(crate) struct RasterTile {
    /// Tile area in the cache's local space.
    pub(crate) rect: IRect,
    pub(crate) pixmap: vello_cpu::Pixmap,
}

/// CPU raster tiles covering a logical `w × h` area offset by `(dx, dy)`.
///
/// Tile `(col, row)` has local origin `(col * unit - dx, row * unit - dy)`.
pub(crate) struct RasterCache {
    pub(crate) tiles: Vec<RasterTile>,
    pub(crate) area: IRect,
}

impl RasterCache {
    pub(crate) fn grid(width: u32, height: u32, dx: i32, dy: i32, unit: u32) -> Vec<IRect> {
        IRect::new(-dx, -dy, width as i32 - dx, height as i32 - dy).tiles(unit)
    }

    /// Split an already-decoded bitmap into tiles at its native size.
    pub(crate) fn from_bitmap(bmp: &Bitmap, unit: u32) -> StratumResult<Self> {
        let area = IRect::new(0, 0, bmp.width as i32, bmp.height as i32);
        let stride = bmp.width as usize * 4;
        let mut tiles = Vec::new();
        for rect in Self::grid(bmp.width, bmp.height, 0, 0, unit) {
            let row_len = rect.width() as usize * 4;
            let mut bytes = Vec::with_capacity(row_len * rect.height() as usize);
            for y in rect.y0..rect.y1 {
                let start = y as usize * stride + rect.x0 as usize * 4;
                bytes.extend_from_slice(&bmp.data[start..start + row_len]);
            }
            let pixmap = pixmap_from_premul_bytes(&bytes, rect.width(), rect.height())?;
            tiles.push(RasterTile { rect, pixmap });
        }
        Ok(Self { tiles, area })
    }

    /// Rasterize background and content of a node box at scale 1.
    ///
    /// Returns `None` when the box is empty or nothing would be painted.
    pub(crate) fn rasterize(
        style: &ComputedStyle,
        content: &Content,
        unit: u32,
    ) -> StratumResult<Option<Self>> {
        let (w, h) = box_pixels(style);
        if w == 0 || h == 0 {
            return Ok(None);
        }
        if style.background_color.is_transparent() && content.is_empty() {
            return Ok(None);
        }

        let bitmap_paint = match content.bitmap() {
            Some(bmp) if bmp.width > 0 && bmp.height > 0 => Some((
                vello_cpu::Image {
                    image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap_from_premul_bytes(
                        &bmp.data, bmp.width, bmp.height,
                    )?)),
                    sampler: vello_cpu::peniko::ImageSampler::default(),
                },
                bmp.width,
                bmp.height,
            )),
            _ => None,
        };

        let box_rect = vello_cpu::kurbo::Rect::new(0.0, 0.0, style.width, style.height);
        let area = IRect::new(0, 0, w as i32, h as i32);
        let mut tiles = Vec::new();
        for rect in Self::grid(w, h, 0, 0, unit) {
            let (tw, th) = pixmap_dims(rect.width(), rect.height())?;
            let mut ctx = vello_cpu::RenderContext::new(tw, th);
            let offset = Affine::translate((-f64::from(rect.x0), -f64::from(rect.y0)));

            let bg = style.background_color;
            if !bg.is_transparent() {
                ctx.set_transform(affine_to_cpu(offset));
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(bg.r, bg.g, bg.b, bg.a));
                ctx.fill_rect(&box_rect);
            }

            match content {
                Content::Path { path, fill } if !fill.is_transparent() => {
                    ctx.set_transform(affine_to_cpu(offset));
                    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                        fill.r, fill.g, fill.b, fill.a,
                    ));
                    ctx.fill_path(&bezpath_to_cpu(path));
                }
                _ => {
                    if let Some((img, iw, ih)) = &bitmap_paint {
                        let (fit, src) = fit_transform(style, *iw, *ih);
                        ctx.set_transform(affine_to_cpu(offset * fit));
                        ctx.set_paint(img.clone());
                        ctx.fill_rect(&src);
                    }
                }
            }

            let mut pixmap = vello_cpu::Pixmap::new(tw, th);
            ctx.flush();
            ctx.render_to_pixmap(&mut pixmap);
            tiles.push(RasterTile { rect, pixmap });
        }
        Ok(Some(Self { tiles, area }))
    }

    /// Upload each tile as one texture; sub-texture boxes are in the cache's local space.
    pub(crate) fn upload(&self, gpu: &mut dyn GpuBackend) -> StratumResult<Vec<SubTexture>> {
        let mut subs = Vec::with_capacity(self.tiles.len());
        for t in &self.tiles {
            let (w, h) = (t.rect.width(), t.rect.height());
            let texture = gpu.create_texture(w, h, Some(t.pixmap.data_as_u8_slice()))?;
            subs.push(SubTexture {
                texture,
                bbox: t.rect.to_rect(),
                width: w,
                height: h,
                tc: None,
            });
        }
        Ok(subs)
    }
}

/// Node box rounded out to whole pixels.
pub(crate) fn box_pixels(style: &ComputedStyle) -> (u32, u32) {
    (
        style.width.max(0.0).ceil() as u32,
        style.height.max(0.0).ceil() as u32,
    )
}

/// Map a native `iw × ih` bitmap into the node box; returns the transform and the source
/// rectangle (in bitmap pixels) to fill.
fn fit_transform(style: &ComputedStyle, iw: u32, ih: u32) -> (Affine, vello_cpu::kurbo::Rect) {
    let (nw, nh) = (f64::from(iw), f64::from(ih));
    match style.object_fit {
        ObjectFit::Fill => (
            Affine::scale_non_uniform(style.width / nw, style.height / nh),
            vello_cpu::kurbo::Rect::new(0.0, 0.0, nw, nh),
        ),
        ObjectFit::Cover => {
            let s = (style.width / nw).max(style.height / nh);
            let vis_w = style.width / s;
            let vis_h = style.height / s;
            let x0 = (nw - vis_w) * 0.5;
            let y0 = (nh - vis_h) * 0.5;
            (
                Affine::scale(s) * Affine::translate((-x0, -y0)),
                vello_cpu::kurbo::Rect::new(x0, y0, x0 + vis_w, y0 + vis_h),
            )
        }
    }
}

pub(crate) fn pixmap_dims(width: u32, height: u32) -> StratumResult<(u16, u16)> {
    let w: u16 = width
        .try_into()
        .map_err(|_| StratumError::resource("pixmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| StratumError::resource("pixmap height exceeds u16"))?;
    Ok((w, h))
}

pub(crate) fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> StratumResult<vello_cpu::Pixmap> {
    let (w, h) = pixmap_dims(width, height)?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(StratumError::resource("pixmap byte len mismatch"));
    }
    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        (width as usize) * (height as usize),
    );
    for px in bytes.chunks_exact(4) {
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, true,
    ))
}

pub(crate) fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

pub(crate) fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/cache/raster.rs"]
mod tests;

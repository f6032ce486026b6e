use crate::foundation::core::{BezPath, Color};
use crate::foundation::error::{StratumError, StratumResult};
use crate::foundation::math::digest_bytes;
use anyhow::Context;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

/// Premultiplied RGBA8 pixels with their native size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Tightly packed premultiplied RGBA8 rows.
    pub data: Vec<u8>,
}

impl Bitmap {
    /// Wrap premultiplied bytes, checking their length.
    pub fn from_premul(width: u32, height: u32, data: Vec<u8>) -> StratumResult<Self> {
        let expected = (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4);
        if data.len() != expected {
            return Err(StratumError::validation(format!(
                "bitmap byte len {} does not match {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }
}

/// Decoded still image, identified by the digest of its encoded bytes.
#[derive(Clone, Debug)]
pub struct ImageSource {
    key: u64,
    decoded: Option<Rc<Bitmap>>,
}

impl ImageSource {
    /// Decode `bytes`; a decode failure yields a source with no content.
    pub fn from_encoded(bytes: &[u8]) -> Self {
        let key = digest_bytes(bytes);
        match decode_image(bytes) {
            Ok(bmp) => Self {
                key,
                decoded: Some(Rc::new(bmp)),
            },
            Err(err) => {
                tracing::warn!(key, error = %err, "image decode failed, node has no content");
                Self { key, decoded: None }
            }
        }
    }

    /// Read and decode an image file; read or decode failures yield a source with no content.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read(path) {
            Ok(bytes) => Self::from_encoded(&bytes),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "image read failed");
                Self {
                    key: digest_bytes(path.as_os_str().as_encoded_bytes()),
                    decoded: None,
                }
            }
        }
    }

    /// Wrap already-decoded premultiplied pixels.
    pub fn from_bitmap(bitmap: Bitmap) -> Self {
        Self {
            key: digest_bytes(&bitmap.data)
                ^ (u64::from(bitmap.width) << 32 | u64::from(bitmap.height)),
            decoded: Some(Rc::new(bitmap)),
        }
    }

    /// Return `true` when pixels are available.
    pub fn is_loaded(&self) -> bool {
        self.decoded.is_some()
    }

    /// Identity used for resource sharing.
    pub fn key(&self) -> u64 {
        self.key
    }

    pub(crate) fn bitmap(&self) -> Option<Rc<Bitmap>> {
        self.decoded.clone()
    }
}

fn decode_image(bytes: &[u8]) -> StratumResult<Bitmap> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut data = rgba.into_raw();
    premultiply_rgba8_in_place(&mut data);
    Bitmap::from_premul(width, height, data)
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

/// A decoded video frame handed over by the media collaborator.
#[derive(Clone, Debug)]
pub struct DecodedFrame {
    /// Unique frame identity.
    pub id: u64,
    /// Frame pixels.
    pub bitmap: Bitmap,
}

/// Supplier of decoded frames for a video node.
pub trait FrameProvider {
    /// The frame to show now, or `None` while waiting on decode.
    fn current(&self) -> Option<Rc<DecodedFrame>>;

    /// Whether `frame_id` is still the frame to show for the current timestamp.
    fn is_authoritative(&self, frame_id: u64) -> bool;
}

/// Video content backed by a [`FrameProvider`].
#[derive(Clone)]
pub struct VideoSource {
    provider: Rc<dyn FrameProvider>,
}

impl VideoSource {
    /// Wrap a frame provider.
    pub fn new(provider: Rc<dyn FrameProvider>) -> Self {
        Self { provider }
    }

    pub(crate) fn provider(&self) -> &dyn FrameProvider {
        self.provider.as_ref()
    }
}

impl std::fmt::Debug for VideoSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoSource").finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct CanvasState {
    bitmap: Rc<Bitmap>,
    revision: u64,
}

/// Externally drawn surface; every [`CanvasSource::update`] bumps its revision.
#[derive(Clone, Debug)]
pub struct CanvasSource {
    state: Rc<RefCell<CanvasState>>,
}

impl CanvasSource {
    /// Create a transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        let len = (width as usize) * (height as usize) * 4;
        Self {
            state: Rc::new(RefCell::new(CanvasState {
                bitmap: Rc::new(Bitmap {
                    width,
                    height,
                    data: vec![0; len],
                }),
                revision: 0,
            })),
        }
    }

    /// Mutate the premultiplied pixels in place.
    pub fn update(&self, f: impl FnOnce(&mut [u8])) {
        let mut st = self.state.borrow_mut();
        f(&mut Rc::make_mut(&mut st.bitmap).data);
        st.revision += 1;
    }

    /// Current revision.
    pub fn revision(&self) -> u64 {
        self.state.borrow().revision
    }

    pub(crate) fn identity(&self) -> usize {
        Rc::as_ptr(&self.state) as *const () as usize
    }

    pub(crate) fn bitmap(&self) -> Rc<Bitmap> {
        self.state.borrow().bitmap.clone()
    }
}

/// What a node paints inside its box, on top of its background.
#[derive(Clone, Debug, Default)]
pub enum Content {
    /// Background only.
    #[default]
    None,
    /// Filled vector path in box-local coordinates.
    Path {
        /// Outline.
        path: BezPath,
        /// Fill color.
        fill: Color,
    },
    /// Still image.
    Image(ImageSource),
    /// Video frames.
    Video(VideoSource),
    /// External surface.
    Canvas(CanvasSource),
}

impl Content {
    /// Pixels of a bitmap-like source, when available right now.
    pub(crate) fn bitmap(&self) -> Option<Rc<Bitmap>> {
        match self {
            Self::None | Self::Path { .. } => None,
            Self::Image(img) => img.bitmap(),
            Self::Video(v) => v.provider().current().map(|f| Rc::new(f.bitmap.clone())),
            Self::Canvas(c) => Some(c.bitmap()),
        }
    }

    /// Return `true` for sources whose textures may be shared across nodes.
    pub(crate) fn is_shareable(&self) -> bool {
        matches!(self, Self::Image(_) | Self::Video(_) | Self::Canvas(_))
    }

    /// Whether a shared source at its native size cannot serve a `w × h` box.
    pub fn needs_regen(&self, w: u32, h: u32) -> bool {
        match self {
            Self::None | Self::Path { .. } => false,
            Self::Image(img) => img
                .decoded
                .as_ref()
                .is_some_and(|b| b.width != w || b.height != h),
            Self::Video(v) => v
                .provider()
                .current()
                .is_some_and(|f| f.bitmap.width != w || f.bitmap.height != h),
            Self::Canvas(c) => {
                let b = c.bitmap();
                b.width != w || b.height != h
            }
        }
    }

    /// Return `true` while the node is waiting on its content to arrive.
    pub(crate) fn is_waiting(&self) -> bool {
        match self {
            Self::Video(v) => v.provider().current().is_none(),
            _ => false,
        }
    }

    /// Return `true` when the content paints nothing.
    pub(crate) fn is_empty(&self) -> bool {
        match self {
            Self::None => true,
            Self::Path { path, fill } => fill.is_transparent() || path.elements().is_empty(),
            Self::Image(img) => !img.is_loaded(),
            Self::Video(v) => v.provider().current().is_none(),
            Self::Canvas(_) => false,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/content.rs"]
mod tests;

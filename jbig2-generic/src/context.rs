//! Context formation for the generic region templates (6.2.5.3, 6.2.5.4).
//!
//! "Form an integer CONTEXT by gathering the values of the image pixels
//! overlaid by the template (including AT pixels) at its current location."
//! (6.2.5.7)
//!
//! There are two ways of computing a context. [`gather_context`] reads every
//! template pixel on its own and works for any adaptive pixel placement. The
//! optimized decode path instead keeps the bits of the rows above in rolling
//! windows over the packed row bytes, described by a [`RollingLayout`]. For
//! the default adaptive pixels both yield the same context for every pixel.

use crate::bitmap::Bitmap;
use crate::template::{AdaptiveTemplatePixel, Template};

/// Gather context bits for a pixel at (x, y) (6.2.5.3, 6.2.5.4).
///
/// Pixels outside the bitmap count as 0. `adaptive_template_pixels` must hold
/// at least [`Template::adaptive_template_pixels`] entries.
pub fn gather_context(
    region: &Bitmap,
    x: u32,
    y: u32,
    template: Template,
    adaptive_template_pixels: &[AdaptiveTemplatePixel],
) -> u32 {
    let x = x as i32;
    let y = y as i32;
    let at = |i: usize| {
        let pixel = adaptive_template_pixels[i];
        region.get_pixel(
            x.saturating_add(pixel.x as i32),
            y.saturating_add(pixel.y as i32),
        )
    };
    let px = |dx: i32, dy: i32| region.get_pixel(x.saturating_add(dx), y.saturating_add(dy));

    let mut context = 0_u32;

    match template {
        // Figure 3a, 16 pixels.
        Template::Template0 => {
            context = (context << 1) | at(3);
            context = (context << 1) | px(-1, -2);
            context = (context << 1) | px(0, -2);
            context = (context << 1) | px(1, -2);
            context = (context << 1) | at(2);

            context = (context << 1) | at(1);
            context = (context << 1) | px(-2, -1);
            context = (context << 1) | px(-1, -1);
            context = (context << 1) | px(0, -1);
            context = (context << 1) | px(1, -1);
            context = (context << 1) | px(2, -1);
            context = (context << 1) | at(0);

            context = (context << 1) | px(-4, 0);
            context = (context << 1) | px(-3, 0);
            context = (context << 1) | px(-2, 0);
            context = (context << 1) | px(-1, 0);
        }
        // Figure 4, 13 pixels.
        Template::Template1 => {
            context = (context << 1) | px(-1, -2);
            context = (context << 1) | px(0, -2);
            context = (context << 1) | px(1, -2);
            context = (context << 1) | px(2, -2);

            context = (context << 1) | px(-2, -1);
            context = (context << 1) | px(-1, -1);
            context = (context << 1) | px(0, -1);
            context = (context << 1) | px(1, -1);
            context = (context << 1) | px(2, -1);
            context = (context << 1) | at(0);

            context = (context << 1) | px(-3, 0);
            context = (context << 1) | px(-2, 0);
            context = (context << 1) | px(-1, 0);
        }
        // Figure 5, 10 pixels.
        Template::Template2 => {
            context = (context << 1) | px(-1, -2);
            context = (context << 1) | px(0, -2);
            context = (context << 1) | px(1, -2);

            context = (context << 1) | px(-2, -1);
            context = (context << 1) | px(-1, -1);
            context = (context << 1) | px(0, -1);
            context = (context << 1) | px(1, -1);
            context = (context << 1) | at(0);

            context = (context << 1) | px(-2, 0);
            context = (context << 1) | px(-1, 0);
        }
        // Figure 6, 10 pixels.
        Template::Template3 => {
            context = (context << 1) | px(-3, -1);
            context = (context << 1) | px(-2, -1);
            context = (context << 1) | px(-1, -1);
            context = (context << 1) | px(0, -1);
            context = (context << 1) | px(1, -1);
            context = (context << 1) | at(0);

            context = (context << 1) | px(-4, 0);
            context = (context << 1) | px(-3, 0);
            context = (context << 1) | px(-2, 0);
            context = (context << 1) | px(-1, 0);
        }
    }

    context
}

/// Bit layout of the rolling context windows for one template, assuming the
/// default adaptive pixels.
///
/// `line1` holds the bytes of the row two above the current one, `line2` the
/// bytes of the row directly above. Each window is refilled with one byte
/// every 8 pixels; the context itself shifts left by one bit per pixel, drops
/// the bits that leave the template (`keep_mask`) and takes in the decoded
/// pixel plus one new bit from each window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RollingLayout {
    /// Whether the template reaches two rows up.
    pub(crate) uses_line1: bool,
    /// Left shift applied to each `line1` byte as it enters the window.
    pub(crate) line1_shift: u32,
    /// Bits of `line1` making up the context at the start of a row.
    pub(crate) line1_init_mask: u32,
    /// Bit of `line1` entering the context with each pixel.
    pub(crate) line1_bit: u32,
    /// Right shift aligning `line2` with the context.
    pub(crate) line2_shift: u32,
    /// Bits of `line2` making up the context at the start of a row.
    pub(crate) line2_init_mask: u32,
    /// Bit of `line2` entering the context with each pixel.
    pub(crate) line2_bit: u32,
    /// Context bits that survive the shift to the next pixel.
    pub(crate) keep_mask: u32,
}

impl RollingLayout {
    const TEMPLATE0: Self = Self {
        uses_line1: true,
        line1_shift: 6,
        line1_init_mask: 0xf800,
        line1_bit: 0x0800,
        line2_shift: 0,
        line2_init_mask: 0x07f0,
        line2_bit: 0x0010,
        keep_mask: 0x7bf7,
    };

    const TEMPLATE1: Self = Self {
        uses_line1: true,
        line1_shift: 4,
        line1_init_mask: 0x1e00,
        line1_bit: 0x0200,
        line2_shift: 1,
        line2_init_mask: 0x01f8,
        line2_bit: 0x0008,
        keep_mask: 0x0efb,
    };

    const TEMPLATE2: Self = Self {
        uses_line1: true,
        line1_shift: 1,
        line1_init_mask: 0x0380,
        line1_bit: 0x0080,
        line2_shift: 3,
        line2_init_mask: 0x007c,
        line2_bit: 0x0004,
        keep_mask: 0x01bd,
    };

    // Template 3 only looks one row up.
    const TEMPLATE3: Self = Self {
        uses_line1: false,
        line1_shift: 0,
        line1_init_mask: 0,
        line1_bit: 0,
        line2_shift: 1,
        line2_init_mask: 0x03f0,
        line2_bit: 0x0010,
        keep_mask: 0x01f7,
    };

    pub(crate) fn for_template(template: Template) -> &'static Self {
        match template {
            Template::Template0 => &Self::TEMPLATE0,
            Template::Template1 => &Self::TEMPLATE1,
            Template::Template2 => &Self::TEMPLATE2,
            Template::Template3 => &Self::TEMPLATE3,
        }
    }

    /// The context of the first pixel in a row.
    #[inline(always)]
    pub(crate) fn initial_context(&self, line1: u32, line2: u32) -> u32 {
        (line1 & self.line1_init_mask) | ((line2 >> self.line2_shift) & self.line2_init_mask)
    }

    /// The context of the next pixel.
    ///
    /// `offset` selects the window bits lining up with the next pixel: `k` for
    /// bit `k` of the most recently loaded byte.
    #[inline(always)]
    pub(crate) fn next_context(
        &self,
        context: u32,
        bit: u32,
        line1: u32,
        line2: u32,
        offset: u32,
    ) -> u32 {
        ((context & self.keep_mask) << 1)
            | bit
            | ((line1 >> offset) & self.line1_bit)
            | ((line2 >> (offset + self.line2_shift)) & self.line2_bit)
    }
}

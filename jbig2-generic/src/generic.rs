//! Generic region decoding using a template and arithmetic coding (6.2.5).

use alloc::vec;
use alloc::vec::Vec;

use log::{debug, warn};

use crate::arithmetic_decoder::{ArithmeticSource, Context};
use crate::bitmap::Bitmap;
use crate::context::{RollingLayout, gather_context};
use crate::error::{ParseError, Result, TemplateError, bail};
use crate::template::{AdaptiveTemplatePixel, DecodePath, Procedure, Template};

/// Parameters of a generic region decoding procedure (Table 2).
#[derive(Debug, Clone)]
pub struct GenericRegionParams<'a> {
    /// "GBW - The width of the region."
    pub width: u32,
    /// "GBH - The height of the region."
    pub height: u32,
    /// "GBTEMPLATE - The template used for arithmetic coding."
    pub template: Template,
    /// "TPGDON - Whether typical prediction is used."
    pub tpgdon: bool,
    /// "GBAT - The adaptive template pixel positions."
    ///
    /// Four pixels for template 0, one for the others.
    pub adaptive_template_pixels: Vec<AdaptiveTemplatePixel>,
    /// "SKIP - A bitmap indicating pixels to skip." Using a skip bitmap
    /// corresponds to `USESKIP = 1`.
    pub skip: Option<&'a Bitmap>,
}

impl<'a> GenericRegionParams<'a> {
    /// Parameters for a region using the template's default adaptive pixels,
    /// without typical prediction and without a skip bitmap.
    pub fn new(width: u32, height: u32, template: Template) -> Self {
        Self {
            width,
            height,
            template,
            tpgdon: false,
            adaptive_template_pixels: template.default_adaptive_pixels().to_vec(),
            skip: None,
        }
    }

    /// Enable or disable typical prediction.
    pub fn with_typical_prediction(mut self, tpgdon: bool) -> Self {
        self.tpgdon = tpgdon;
        self
    }

    /// Use the given adaptive template pixels.
    pub fn with_adaptive_template_pixels(mut self, pixels: &[AdaptiveTemplatePixel]) -> Self {
        self.adaptive_template_pixels = pixels.to_vec();
        self
    }

    /// Skip every pixel that is set in `skip`.
    pub fn with_skip(mut self, skip: &'a Bitmap) -> Self {
        self.skip = Some(skip);
        self
    }

    /// A fresh set of contexts, one for every context value of the template.
    pub fn new_contexts(&self) -> Vec<Context> {
        vec![Context::default(); self.template.context_count()]
    }

    /// The procedure the region is decoded with.
    pub fn procedure(&self) -> Procedure {
        Procedure::select(
            self.template,
            &self.adaptive_template_pixels,
            self.skip.is_some(),
        )
    }

    pub(crate) fn validate(&self, context_count: usize) -> Result<()> {
        if self.adaptive_template_pixels.len() != self.template.adaptive_template_pixels() {
            bail!(TemplateError::InvalidAtPixelCount);
        }

        if context_count < self.template.context_count() {
            bail!(TemplateError::InsufficientContexts);
        }

        Ok(())
    }
}

/// Decodes a whole generic region in one call.
#[derive(Debug, Clone)]
pub struct GenericRegionDecoder<'a> {
    params: GenericRegionParams<'a>,
    force_general: bool,
}

impl<'a> GenericRegionDecoder<'a> {
    /// Create a new decoder for the given region.
    pub fn new(params: GenericRegionParams<'a>) -> Self {
        Self {
            params,
            force_general: false,
        }
    }

    /// Always read context pixels individually, even where the rolling
    /// windows would apply. The decoded region is the same either way.
    pub fn force_general_path(mut self) -> Self {
        self.force_general = true;
        self
    }

    /// The region parameters.
    pub fn params(&self) -> &GenericRegionParams<'a> {
        &self.params
    }

    /// The procedure the region is decoded with.
    pub fn procedure(&self) -> Procedure {
        select_procedure(&self.params, self.force_general)
    }

    /// Decode the region (6.2.5.7).
    ///
    /// `contexts` must hold at least [`Template::context_count`] entries; for a
    /// new region they should all be in their default state. Regions whose
    /// size fails [`Bitmap::is_valid_size`] are not decoded and yield an empty
    /// bitmap.
    pub fn decode_arith<S: ArithmeticSource>(
        &self,
        mut source: S,
        contexts: &mut [Context],
    ) -> Result<Bitmap> {
        let params = &self.params;

        if !Bitmap::is_valid_size(params.width, params.height) {
            warn!(
                "skipping generic region with invalid size {}x{}",
                params.width, params.height
            );

            return Ok(Bitmap::empty(params.width, params.height));
        }

        params.validate(contexts.len())?;

        let procedure = self.procedure();
        debug!(
            "decoding {}x{} generic region with {:?}, {:?} path",
            params.width, params.height, procedure.template, procedure.path
        );

        let mut bitmap = Bitmap::new(params.width, params.height)?;

        // "1) Set: LTP = 0" (6.2.5.7)
        let mut ltp = false;

        // "3) Decode each row as follows:" (6.2.5.7)
        for y in 0..params.height {
            if let Err(e) = decode_row(
                &mut source,
                contexts,
                params,
                procedure.path,
                &mut bitmap,
                y,
                &mut ltp,
            ) {
                warn!("generic region decoding stopped at row {y}: {e}");

                return Err(e);
            }
        }

        Ok(bitmap)
    }
}

pub(crate) fn select_procedure(params: &GenericRegionParams<'_>, force_general: bool) -> Procedure {
    let mut procedure = params.procedure();

    if force_general {
        procedure.path = DecodePath::General;
    }

    procedure
}

/// Decode row `y` of the region, including the typical prediction bit.
pub(crate) fn decode_row<S: ArithmeticSource + ?Sized>(
    source: &mut S,
    contexts: &mut [Context],
    params: &GenericRegionParams<'_>,
    path: DecodePath,
    bitmap: &mut Bitmap,
    y: u32,
    ltp: &mut bool,
) -> Result<()> {
    // "b) If TPGDON is 1, then decode a bit using the arithmetic entropy
    // coder" (6.2.5.7)
    if params.tpgdon {
        let sltp = decode_bit(source, contexts, params.template.sltp_context())?;
        // "Let SLTP be the value of this bit. Set: LTP = LTP XOR SLTP"
        *ltp ^= sltp != 0;
    }

    // "c) If LTP = 1 then set every pixel of the current row of GBREG equal
    // to the corresponding pixel of the row immediately above." (6.2.5.7)
    if *ltp {
        bitmap.copy_line(y, y as i32 - 1);

        return Ok(());
    }

    // "d) If LTP = 0 then, from left to right, decode each pixel of the
    // current row of GBREG." (6.2.5.7)
    match path {
        DecodePath::Optimized => decode_row_optimized(
            source,
            contexts,
            bitmap,
            y,
            RollingLayout::for_template(params.template),
        ),
        DecodePath::General => decode_row_general(source, contexts, params, bitmap, y),
    }
}

/// Decode one bit, failing if the source has run out of data.
#[inline(always)]
fn decode_bit<S: ArithmeticSource + ?Sized>(
    source: &mut S,
    contexts: &mut [Context],
    context: u32,
) -> Result<u32> {
    if source.is_complete() {
        bail!(ParseError::UnexpectedEof);
    }

    Ok(source.decode(&mut contexts[context as usize]))
}

/// Decode a row using rolling context windows over the packed rows above.
///
/// Each byte of the row is assembled in a register and written out once it
/// is complete.
fn decode_row_optimized<S: ArithmeticSource + ?Sized>(
    source: &mut S,
    contexts: &mut [Context],
    bitmap: &mut Bitmap,
    y: u32,
    layout: &RollingLayout,
) -> Result<()> {
    let stride = bitmap.stride();
    let line_bytes = stride - 1;
    let bits_left = bitmap.width() - 8 * line_bytes as u32;

    let start = y as usize * stride;
    let (history, rest) = bitmap.data_mut().split_at_mut(start);
    let current = &mut rest[..stride];

    let above = (y >= 1).then(|| &history[start - stride..]);
    let two_above =
        (layout.uses_line1 && y >= 2).then(|| &history[start - 2 * stride..start - stride]);

    let mut line1 = two_above.map_or(0, |row| (row[0] as u32) << layout.line1_shift);
    let mut line2 = above.map_or(0, |row| row[0] as u32);
    let mut context = layout.initial_context(line1, line2);

    for cc in 0..line_bytes {
        if let Some(row) = two_above {
            line1 = (line1 << 8) | ((row[cc + 1] as u32) << layout.line1_shift);
        }
        if let Some(row) = above {
            line2 = (line2 << 8) | row[cc + 1] as u32;
        }

        let mut byte = 0_u8;
        for k in (0..8).rev() {
            let bit = decode_bit(source, contexts, context)?;
            byte |= (bit as u8) << k;
            context = layout.next_context(context, bit, line1, line2, k);
        }

        current[cc] = byte;
    }

    // The last byte has no successor to load.
    line1 <<= 8;
    line2 <<= 8;

    let mut byte = 0_u8;
    for k in 0..bits_left {
        let bit = decode_bit(source, contexts, context)?;
        byte |= (bit as u8) << (7 - k);
        context = layout.next_context(context, bit, line1, line2, 7 - k);
    }

    current[line_bytes] = byte;

    Ok(())
}

/// Decode a row reading every template pixel individually.
fn decode_row_general<S: ArithmeticSource + ?Sized>(
    source: &mut S,
    contexts: &mut [Context],
    params: &GenericRegionParams<'_>,
    bitmap: &mut Bitmap,
    y: u32,
) -> Result<()> {
    for x in 0..bitmap.width() {
        // "If USESKIP is 1 and the pixel in the bitmap SKIP at the location
        // corresponding to the current pixel is 1, then set the current pixel
        // to 0." (6.2.5.7)
        if params
            .skip
            .is_some_and(|skip| skip.get_pixel(x as i32, y as i32) != 0)
        {
            bitmap.set_pixel(x, y, false);
            continue;
        }

        let context = gather_context(
            bitmap,
            x,
            y,
            params.template,
            &params.adaptive_template_pixels,
        );
        let pixel = decode_bit(source, contexts, context)?;
        bitmap.set_pixel(x, y, pixel != 0);
    }

    Ok(())
}

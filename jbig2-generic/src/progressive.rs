//! Progressive decoding of generic regions.
//!
//! A [`ProgressiveDecoder`] decodes the same rows as
//! [`GenericRegionDecoder`](crate::GenericRegionDecoder), but checks a
//! [`PauseIndicator`] after each row and hands control back to the caller when
//! asked to. Decoding continues at the next row with
//! [`continue_decode`](ProgressiveDecoder::continue_decode), and the final
//! bitmap is identical to the one decoded in a single call.

use log::{debug, trace, warn};

use crate::arithmetic_decoder::{ArithmeticSource, Context};
use crate::bitmap::Bitmap;
use crate::error::Result;
use crate::generic::{GenericRegionParams, decode_row, select_procedure};
use crate::template::{DecodePath, Procedure, Template};

/// Decides whether a progressive decode should hand back control.
pub trait PauseIndicator {
    /// Whether decoding should pause now.
    fn need_to_pause_now(&mut self) -> bool;
}

impl<F: FnMut() -> bool> PauseIndicator for F {
    fn need_to_pause_now(&mut self) -> bool {
        self()
    }
}

/// A pause indicator that never pauses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverPause;

impl PauseIndicator for NeverPause {
    fn need_to_pause_now(&mut self) -> bool {
        false
    }
}

/// Status of a progressive decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// Decoding has not started.
    Ready,
    /// Decoding paused and can be continued.
    ToBeContinued,
    /// The region is fully decoded.
    Finished,
    /// Decoding failed. The decoder cannot be continued.
    Error,
}

/// The coding a progressive decode was started with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeType {
    /// Template based arithmetic coding (6.2.5).
    Arithmetic,
}

/// A rectangle of region pixels, `right` and `bottom` being exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    /// Left edge.
    pub left: u32,
    /// Top edge.
    pub top: u32,
    /// Right edge.
    pub right: u32,
    /// Bottom edge.
    pub bottom: u32,
}

/// Where a paused decode picks up again.
///
/// The rows above `loop_index` are final. The row bytes of the next row start
/// at `loop_index * stride` in the bitmap data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResumeState {
    /// The next row to decode.
    pub loop_index: u32,
    /// The typical prediction state carried over from the previous row.
    pub ltp: bool,
}

/// Decodes a generic region in steps of whole rows.
#[derive(Debug)]
pub struct ProgressiveDecoder<'a> {
    params: GenericRegionParams<'a>,
    force_general: bool,
    status: DecodeStatus,
    decode_type: Option<DecodeType>,
    procedure: Option<Procedure>,
    state: ResumeState,
    replace_rect: Rect,
    bitmap: Option<Bitmap>,
}

impl<'a> ProgressiveDecoder<'a> {
    /// Create a new decoder for the given region.
    pub fn new(params: GenericRegionParams<'a>) -> Self {
        Self {
            params,
            force_general: false,
            status: DecodeStatus::Ready,
            decode_type: None,
            procedure: None,
            state: ResumeState::default(),
            replace_rect: Rect::default(),
            bitmap: None,
        }
    }

    /// Always read context pixels individually, even where the rolling
    /// windows would apply.
    pub fn force_general_path(mut self) -> Self {
        self.force_general = true;
        self
    }

    /// Start decoding the region and decode rows until the pause indicator
    /// asks for a pause or the region is done.
    ///
    /// `contexts` must hold at least [`Template::context_count`] entries.
    pub fn start_decode_arith<S, P>(
        &mut self,
        source: &mut S,
        contexts: &mut [Context],
        pause: &mut P,
    ) -> DecodeStatus
    where
        S: ArithmeticSource + ?Sized,
        P: PauseIndicator + ?Sized,
    {
        let params = &self.params;

        if !Bitmap::is_valid_size(params.width, params.height) {
            warn!(
                "skipping generic region with invalid size {}x{}",
                params.width, params.height
            );

            self.bitmap = Some(Bitmap::empty(params.width, params.height));
            self.status = DecodeStatus::Finished;

            return self.status;
        }

        self.status = DecodeStatus::Ready;

        if let Err(e) = params.validate(contexts.len()) {
            warn!("cannot decode generic region: {e}");
            self.status = DecodeStatus::Error;

            return self.status;
        }

        match Bitmap::new(params.width, params.height) {
            Ok(bitmap) => self.bitmap = Some(bitmap),
            Err(e) => {
                warn!("cannot decode generic region: {e}");
                self.bitmap = None;
                self.status = DecodeStatus::Error;

                return self.status;
            }
        }

        let procedure = select_procedure(params, self.force_general);
        debug!(
            "progressively decoding {}x{} generic region with {:?}, {:?} path",
            params.width, params.height, procedure.template, procedure.path
        );

        self.decode_type = Some(DecodeType::Arithmetic);
        self.procedure = Some(procedure);
        self.state = ResumeState::default();

        self.step(source, contexts, pause)
    }

    /// Continue a paused decode.
    ///
    /// Does nothing unless the status is [`DecodeStatus::ToBeContinued`].
    pub fn continue_decode<S, P>(
        &mut self,
        source: &mut S,
        contexts: &mut [Context],
        pause: &mut P,
    ) -> DecodeStatus
    where
        S: ArithmeticSource + ?Sized,
        P: PauseIndicator + ?Sized,
    {
        if self.status != DecodeStatus::ToBeContinued {
            return self.status;
        }

        if self.decode_type != Some(DecodeType::Arithmetic) {
            self.status = DecodeStatus::Error;

            return self.status;
        }

        if let Err(e) = self.params.validate(contexts.len()) {
            warn!("cannot continue generic region: {e}");
            self.status = DecodeStatus::Error;

            return self.status;
        }

        trace!("resuming generic region at row {}", self.state.loop_index);

        self.step(source, contexts, pause)
    }

    /// The current status.
    pub fn status(&self) -> DecodeStatus {
        self.status
    }

    /// The coding the decode was started with, if any.
    pub fn decode_type(&self) -> Option<DecodeType> {
        self.decode_type
    }

    /// The procedure chosen when decoding started.
    pub fn procedure(&self) -> Option<Procedure> {
        self.procedure
    }

    /// The resume position.
    pub fn resume_state(&self) -> ResumeState {
        self.state
    }

    /// The rows decoded by the most recent start or continue call.
    pub fn replace_rect(&self) -> Rect {
        self.replace_rect
    }

    /// The region bitmap. Rows above the resume position are final.
    pub fn bitmap(&self) -> Option<&Bitmap> {
        self.bitmap.as_ref()
    }

    /// Take the region bitmap out of the decoder.
    ///
    /// Taking the bitmap of a paused decode ends it: continuing afterwards
    /// reports [`DecodeStatus::Error`].
    pub fn take_bitmap(&mut self) -> Option<Bitmap> {
        self.bitmap.take()
    }

    fn step<S, P>(
        &mut self,
        source: &mut S,
        contexts: &mut [Context],
        pause: &mut P,
    ) -> DecodeStatus
    where
        S: ArithmeticSource + ?Sized,
        P: PauseIndicator + ?Sized,
    {
        let top = self.state.loop_index;

        self.status = match self.decode_rows(source, contexts, pause) {
            Ok(status) => status,
            Err(e) => {
                warn!(
                    "generic region decoding stopped at row {}: {e}",
                    self.state.loop_index
                );

                DecodeStatus::Error
            }
        };

        self.replace_rect = Rect {
            left: 0,
            top,
            right: self.params.width,
            bottom: self.state.loop_index,
        };

        match self.status {
            DecodeStatus::Finished => self.state.loop_index = 0,
            DecodeStatus::ToBeContinued => {
                trace!("pausing generic region at row {}", self.state.loop_index);
            }
            DecodeStatus::Ready | DecodeStatus::Error => {}
        }

        self.status
    }

    fn decode_rows<S, P>(
        &mut self,
        source: &mut S,
        contexts: &mut [Context],
        pause: &mut P,
    ) -> Result<DecodeStatus>
    where
        S: ArithmeticSource + ?Sized,
        P: PauseIndicator + ?Sized,
    {
        let (Some(procedure), Some(bitmap)) = (self.procedure, self.bitmap.as_mut()) else {
            warn!("generic region has no bitmap to continue decoding into");

            return Ok(DecodeStatus::Error);
        };

        while self.state.loop_index < self.params.height {
            let y = self.state.loop_index;

            decode_row(
                source,
                contexts,
                &self.params,
                procedure.path,
                bitmap,
                y,
                &mut self.state.ltp,
            )?;

            self.state.loop_index += 1;

            if polls_after_row(procedure, y) && pause.need_to_pause_now() {
                return Ok(DecodeStatus::ToBeContinued);
            }
        }

        Ok(DecodeStatus::Finished)
    }
}

/// Whether the pause indicator is consulted after row `y`.
///
/// The template 2 rolling window path only checks every 50 rows.
fn polls_after_row(procedure: Procedure, y: u32) -> bool {
    match (procedure.template, procedure.path) {
        (Template::Template2, DecodePath::Optimized) => y % 50 == 0,
        _ => true,
    }
}

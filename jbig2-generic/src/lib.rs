/*!
A memory-safe, pure-Rust decoder for JBIG2 generic regions.

`jbig2-generic` implements the generic region decoding procedure with
template based arithmetic coding, as specified in ITU-T T.88 (also known as
ISO/IEC 14492), section 6.2.5. A generic region is a bi-level bitmap whose
pixels are decoded one by one, each with a context formed from the pixels
decoded before it.

Regions can be decoded in a single call with [`GenericRegionDecoder`], or in
steps of whole rows with [`ProgressiveDecoder`], which hands control back to
the caller whenever a [`PauseIndicator`] asks for it. Both produce the same
bitmap.

Segment parsing, MMR coding and the other region types are not part of this
crate; the caller provides the region parameters and the position of the
coded data.

# Example
```rust
use jbig2_generic::{ArithmeticDecoder, GenericRegionDecoder, GenericRegionParams, Template};

let data = [0x5A; 64];
let params = GenericRegionParams::new(16, 4, Template::Template0).with_typical_prediction(true);
let mut contexts = params.new_contexts();

let mut decoder = ArithmeticDecoder::new(&data);
let bitmap = GenericRegionDecoder::new(params)
    .decode_arith(&mut decoder, &mut contexts)
    .unwrap();

println!("{}x{} region", bitmap.width(), bitmap.height());
```

# Cargo features
- `std` (default): Use the standard library. Without it, the crate only
  requires `alloc`.
- `image` (default): Convert bitmaps into [`image::GrayImage`]s.

# Safety
This crate forbids unsafe code via a crate-level attribute.
*/

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

mod arithmetic_decoder;
mod bitmap;
mod context;
mod error;
mod generic;
mod progressive;
mod template;

#[cfg(test)]
mod test_util;

pub use arithmetic_decoder::{ArithmeticDecoder, ArithmeticSource, Context};
pub use bitmap::{Bitmap, MAX_IMAGE_PIXELS};
pub use context::gather_context;
pub use error::{DecodeError, ParseError, RegionError, Result, TemplateError};
pub use generic::{GenericRegionDecoder, GenericRegionParams};
pub use progressive::{
    DecodeStatus, DecodeType, NeverPause, PauseIndicator, ProgressiveDecoder, Rect, ResumeState,
};
pub use template::{AdaptiveTemplatePixel, DecodePath, Procedure, Template, select_path};

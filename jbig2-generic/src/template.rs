//! Templates, adaptive template pixels and decode path selection (6.2.5.3,
//! 6.2.5.4).

use crate::error::{Result, TemplateError, err};

/// Template used for arithmetic coding (6.2.5.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    /// Template 0: 16 pixels (6.2.5.3, Figure 3)
    Template0 = 0,
    /// Template 1: 13 pixels (6.2.5.3, Figure 4)
    Template1 = 1,
    /// Template 2: 10 pixels (6.2.5.3, Figure 5)
    Template2 = 2,
    /// Template 3: 10 pixels (6.2.5.3, Figure 6)
    Template3 = 3,
}

impl Template {
    /// Parse a `GBTEMPLATE` value.
    pub fn from_value(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Template0),
            1 => Ok(Self::Template1),
            2 => Ok(Self::Template2),
            3 => Ok(Self::Template3),
            _ => err!(TemplateError::Invalid),
        }
    }

    /// Number of context bits for this template (6.2.5.3).
    pub fn context_bits(self) -> usize {
        match self {
            Self::Template0 => 16,
            Self::Template1 => 13,
            Self::Template2 | Self::Template3 => 10,
        }
    }

    /// Number of contexts a context array for this template must hold.
    pub fn context_count(self) -> usize {
        1 << self.context_bits()
    }

    /// Number of adaptive template pixels used by this template.
    pub fn adaptive_template_pixels(self) -> usize {
        match self {
            Self::Template0 => 4,
            Self::Template1 | Self::Template2 | Self::Template3 => 1,
        }
    }

    /// The nominal adaptive template pixel positions (Figures 3-6).
    ///
    /// Encoders almost always use these, which is what makes the optimized
    /// decode path applicable.
    pub fn default_adaptive_pixels(self) -> &'static [AdaptiveTemplatePixel] {
        const TEMPLATE0: [AdaptiveTemplatePixel; 4] = [
            AdaptiveTemplatePixel::new(3, -1),
            AdaptiveTemplatePixel::new(-3, -1),
            AdaptiveTemplatePixel::new(2, -2),
            AdaptiveTemplatePixel::new(-2, -2),
        ];
        const TEMPLATE1: [AdaptiveTemplatePixel; 1] = [AdaptiveTemplatePixel::new(3, -1)];
        const TEMPLATE23: [AdaptiveTemplatePixel; 1] = [AdaptiveTemplatePixel::new(2, -1)];

        match self {
            Self::Template0 => &TEMPLATE0,
            Self::Template1 => &TEMPLATE1,
            Self::Template2 | Self::Template3 => &TEMPLATE23,
        }
    }

    /// The context used to decode the SLTP bit (6.2.5.7, Figures 8-11).
    pub fn sltp_context(self) -> u32 {
        match self {
            Self::Template0 => 0b1001101100100101,
            Self::Template1 => 0b0011110010101,
            Self::Template2 => 0b0011100101,
            Self::Template3 => 0b0110010101,
        }
    }
}

/// Adaptive template pixel position, relative to the pixel being decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdaptiveTemplatePixel {
    /// Horizontal offset.
    pub x: i8,
    /// Vertical offset, 0 for the current row and negative for rows above.
    pub y: i8,
}

impl AdaptiveTemplatePixel {
    /// Create a new adaptive template pixel.
    pub const fn new(x: i8, y: i8) -> Self {
        Self { x, y }
    }
}

/// The way the pixels of a region are decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodePath {
    /// Context bits are maintained in rolling windows over the packed rows.
    ///
    /// Only applicable with the template's default adaptive pixels and no
    /// skip bitmap.
    Optimized,
    /// Every context pixel is read individually.
    General,
}

/// Choose the decode path for a region.
pub fn select_path(
    template: Template,
    adaptive_template_pixels: &[AdaptiveTemplatePixel],
    use_skip: bool,
) -> DecodePath {
    if !use_skip && adaptive_template_pixels == template.default_adaptive_pixels() {
        DecodePath::Optimized
    } else {
        DecodePath::General
    }
}

/// A template together with the decode path chosen for it.
///
/// Chosen once when decoding starts and kept until the region is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Procedure {
    /// The template.
    pub template: Template,
    /// The decode path.
    pub path: DecodePath,
}

impl Procedure {
    /// Select the procedure for the given region configuration.
    pub fn select(
        template: Template,
        adaptive_template_pixels: &[AdaptiveTemplatePixel],
        use_skip: bool,
    ) -> Self {
        Self {
            template,
            path: select_path(template, adaptive_template_pixels, use_skip),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Template; 4] = [
        Template::Template0,
        Template::Template1,
        Template::Template2,
        Template::Template3,
    ];

    #[test]
    fn defaults_select_optimized() {
        for template in ALL {
            assert_eq!(
                select_path(template, template.default_adaptive_pixels(), false),
                DecodePath::Optimized
            );
        }
    }

    #[test]
    fn skip_forces_general() {
        for template in ALL {
            assert_eq!(
                select_path(template, template.default_adaptive_pixels(), true),
                DecodePath::General
            );
        }
    }

    #[test]
    fn moved_at_pixel_forces_general() {
        let mut at = [
            AdaptiveTemplatePixel::new(3, -1),
            AdaptiveTemplatePixel::new(-3, -1),
            AdaptiveTemplatePixel::new(2, -2),
            AdaptiveTemplatePixel::new(-2, -2),
        ];
        assert_eq!(
            select_path(Template::Template0, &at, false),
            DecodePath::Optimized
        );

        at[3] = AdaptiveTemplatePixel::new(-1, -2);
        assert_eq!(
            select_path(Template::Template0, &at, false),
            DecodePath::General
        );

        // The template 1 default is not the template 2 default.
        assert_eq!(
            select_path(Template::Template2, &[AdaptiveTemplatePixel::new(3, -1)], false),
            DecodePath::General
        );
        assert_eq!(
            select_path(Template::Template3, &[AdaptiveTemplatePixel::new(2, -1)], false),
            DecodePath::Optimized
        );
    }

    #[test]
    fn sltp_context_fits_template() {
        for template in ALL {
            assert!((template.sltp_context() as usize) < template.context_count());
        }

        assert_eq!(Template::Template0.sltp_context(), 0x9b25);
        assert_eq!(Template::Template1.sltp_context(), 0x0795);
        assert_eq!(Template::Template2.sltp_context(), 0x00e5);
        assert_eq!(Template::Template3.sltp_context(), 0x0195);
    }

    #[test]
    fn template_values() {
        assert_eq!(Template::from_value(2), Ok(Template::Template2));
        assert_eq!(Template::from_value(4), Err(TemplateError::Invalid.into()));
    }
}

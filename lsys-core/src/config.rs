/// Settings for [`crate::growth`].
///
/// `time_scale` converts elapsed clock time into growth units; the default
/// of `1e-6` treats elapsed time as microseconds. `min_dimension` is the
/// floor applied to `length` and `radius` after every change, `None`
/// leaves dimensions unclamped so negative growth can drive them below zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GrowthConfig {
    pub time_scale: f32,
    pub min_dimension: Option<f32>,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0e-6,
            min_dimension: Some(0.0),
        }
    }
}

/// Settings for [`crate::mesh`].
///
/// `taper` scales the radius at the top of each segment relative to the
/// bottom; `1.0` gives straight cylinders.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshConfig {
    pub segments: u32,
    pub taper: f32,
}

impl MeshConfig {
    pub const MIN_SEGMENTS: u32 = 3;
    pub const MAX_SEGMENTS: u32 = 256;

    /// Segment count actually used for generation.
    pub fn clamped_segments(&self) -> u32 {
        self.segments.clamp(Self::MIN_SEGMENTS, Self::MAX_SEGMENTS)
    }
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            segments: 16,
            taper: 1.0,
        }
    }
}

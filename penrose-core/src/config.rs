/// Tunables for a [`crate::tiling::TilingModel`].
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Cell size of the [`crate::grid::Grid`] rebuilt on every relaxation step.
    pub cell_size: f64,
    /// Scale applied to the averaged force when moving a node in `update`.
    pub step_len: f64,
    /// Keep the first and last node of every canonical edge in place.
    pub pin_endpoints: bool,
    /// Default threshold for [`crate::tiling::TilingModel::subdivide`].
    pub max_segment: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cell_size: 0.1,
            step_len: 0.05,
            pin_endpoints: true,
            max_segment: 0.1,
        }
    }
}

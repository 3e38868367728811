//! Screen geometry shared by the compositor, the graphs, and the binaries.
//!
//! The display is split into three fixed horizontal regions: the numeric
//! readout on top, the two overlaid history graphs in the middle, and the
//! clock strip along the bottom.

/// Display width in pixels.
pub const DISPLAY_WIDTH_PX: u16 = 320;

/// Display height in pixels.
pub const DISPLAY_HEIGHT_PX: u16 = 240;

/// Height of the numeric readout region at the top of the screen.
pub const READOUT_HEIGHT_PX: u16 = 128;

/// Height of each history graph panel.
pub const GRAPH_HEIGHT_PX: u16 = 90;

/// Y coordinate where both graph panels are composited onto the display.
pub const GRAPH_ORIGIN_Y: i32 = 129;

/// Y coordinate of the horizontal divider above the clock strip.
pub const CLOCK_DIVIDER_Y: i32 = 220;

/// Height of the clock strip (divider row included).
pub const CLOCK_STRIP_HEIGHT_PX: u16 = DISPLAY_HEIGHT_PX - CLOCK_DIVIDER_Y as u16;

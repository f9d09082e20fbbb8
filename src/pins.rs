//! GPIO / peripheral pin assignments for the controller board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Signal head outputs (active HIGH)
// ---------------------------------------------------------------------------

/// Red lamp. Also half of the synthesized yellow aspect.
pub const RED_GPIO: i32 = 11;
/// Green lamp. Also half of the synthesized yellow aspect.
pub const GREEN_GPIO: i32 = 12;
/// Blue channel of the RGB head. Unused by any aspect, held LOW.
pub const BLUE_GPIO: i32 = 13;

/// Every output the controller drives, in bring-up order.
pub const OUTPUTS: [i32; 3] = [RED_GPIO, GREEN_GPIO, BLUE_GPIO];

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Momentary push-button. HIGH while held pauses the auto cycle.
pub const PAUSE_GPIO: i32 = 16;

// ---------------------------------------------------------------------------
// UART command console
// ---------------------------------------------------------------------------

pub const UART_TX_GPIO: i32 = 17;
pub const UART_RX_GPIO: i32 = 18;
pub const UART_BAUD: u32 = 115_200;

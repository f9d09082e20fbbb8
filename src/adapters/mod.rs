//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements   | Connects to                   |
//! |----------------|--------------|-------------------------------|
//! | `gpio`         | GpioPort     | embedded-hal pins / simulator |
//! | `uart_console` | CharSource   | UART1 RX (host: loopback)     |
//! | `log_sink`     | StatusSink   | Serial log output             |
//! | `time`         |              | ESP32 high-resolution timer   |

pub mod gpio;
pub mod log_sink;
pub mod time;
pub mod uart_console;

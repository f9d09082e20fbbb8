//! Serial console character source.
//!
//! On ESP-IDF this wraps a `UartDriver` and reads with a zero timeout,
//! so polling never blocks the input task. On the host the console is a
//! loopback buffer that tests and simulations write into.

use crate::app::ports::CharSource;

#[cfg(target_os = "espidf")]
pub struct UartConsole {
    uart: esp_idf_hal::uart::UartDriver<'static>,
}

#[cfg(target_os = "espidf")]
impl UartConsole {
    pub fn new(uart: esp_idf_hal::uart::UartDriver<'static>) -> Self {
        Self { uart }
    }
}

#[cfg(target_os = "espidf")]
impl CharSource for UartConsole {
    fn try_read_char(&mut self) -> Option<char> {
        let mut byte = [0u8; 1];
        match self.uart.read(&mut byte, esp_idf_hal::delay::NON_BLOCK) {
            Ok(1) => Some(char::from(byte[0])),
            Ok(_) => None,
            Err(e) => {
                log::warn!("UART read failed: {}", e);
                None
            }
        }
    }
}

/// Host loopback console. Clones share the receive buffer.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Clone, Default)]
pub struct UartConsole {
    rx: std::sync::Arc<std::sync::Mutex<std::collections::VecDeque<char>>>,
}

#[cfg(not(target_os = "espidf"))]
impl UartConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `text` as if it had arrived on the wire.
    pub fn inject(&self, text: &str) {
        self.rx
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .extend(text.chars());
    }
}

#[cfg(not(target_os = "espidf"))]
impl CharSource for UartConsole {
    fn try_read_char(&mut self) -> Option<char> {
        self.rx
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .pop_front()
    }
}

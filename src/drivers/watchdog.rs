//! Idle-loop watchdog.
//!
//! Once the controller is up, `main` has nothing left to do but sleep.
//! It subscribes to the ESP-IDF task watchdog (TWDT) and feeds it on
//! every pass of that loop, so a wedged coordinator resets the board.
//! The actuator and dispatcher threads are not subscribed: a long hold
//! is legitimate and must not trip the watchdog.
//!
//! Host builds get the same API with nothing behind it.

use log::{info, warn};

/// Reset the device if not fed within this window.
pub const WATCHDOG_TIMEOUT_MS: u32 = 10_000;

pub struct Watchdog {
    armed: bool,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new()
    }
}

impl Watchdog {
    /// Arm the TWDT for the calling thread. A failure is logged and leaves
    /// the watchdog disarmed; the lights keep working either way.
    pub fn new() -> Self {
        let armed = twdt::subscribe_current(WATCHDOG_TIMEOUT_MS);
        if armed {
            info!("Idle watchdog armed, {} ms", WATCHDOG_TIMEOUT_MS);
        } else {
            warn!("Idle watchdog not armed");
        }
        Self { armed }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Call from the idle loop, well inside [`WATCHDOG_TIMEOUT_MS`].
    pub fn feed(&self) {
        if self.armed {
            twdt::reset();
        }
    }
}

#[cfg(target_os = "espidf")]
mod twdt {
    use esp_idf_svc::sys::{
        ESP_OK, esp_task_wdt_add, esp_task_wdt_config_t, esp_task_wdt_reconfigure,
        esp_task_wdt_reset,
    };

    pub fn subscribe_current(timeout_ms: u32) -> bool {
        let cfg = esp_task_wdt_config_t {
            timeout_ms,
            idle_core_mask: 0,
            trigger_panic: true,
        };
        // SAFETY: plain FFI calls; a null handle means the calling task.
        unsafe {
            let ret = esp_task_wdt_reconfigure(&cfg);
            if ret != ESP_OK {
                log::debug!("TWDT reconfigure: {} (already running?)", ret);
            }
            esp_task_wdt_add(core::ptr::null_mut()) == ESP_OK
        }
    }

    pub fn reset() {
        // SAFETY: only reached after a successful subscribe.
        unsafe {
            esp_task_wdt_reset();
        }
    }
}

#[cfg(not(target_os = "espidf"))]
mod twdt {
    pub fn subscribe_current(_timeout_ms: u32) -> bool {
        false
    }

    pub fn reset() {}
}

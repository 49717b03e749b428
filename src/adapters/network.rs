//! Link reachability probe.
//!
//! Network bring-up (Wi-Fi, Thread, Ethernet) happens before the node
//! starts; this adapter only answers "is the default interface up?".

use log::debug;

use crate::app::ports::LinkProbe;

/// [`LinkProbe`] over the ESP-IDF default network interface.
#[derive(Debug, Default)]
pub struct NetifProbe {
    last: bool,
}

impl NetifProbe {
    pub fn new() -> Self {
        Self { last: false }
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_up() -> bool {
        // SAFETY: both calls only read netif state; a null default netif
        // is checked before use.
        unsafe {
            let netif = esp_idf_svc::sys::esp_netif_get_default_netif();
            !netif.is_null() && esp_idf_svc::sys::esp_netif_is_netif_up(netif)
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_up() -> bool {
        true
    }
}

impl LinkProbe for NetifProbe {
    fn probe_link_reachable(&mut self) -> bool {
        let up = Self::platform_is_up();
        if up != self.last {
            debug!("LINK | default netif {}", if up { "up" } else { "down" });
            self.last = up;
        }
        up
    }
}

//! Device identity derived from the factory MAC address.
//!
//! The CVD node uses the full MAC in lowercase hex (`deadbeefcafe`) as its
//! broker client identifier and as `clientId` in every report.  It is
//! stable across reboots since the MAC is burned into eFuse.

use core::fmt::Write;

/// Broker client identifier: 12 hex chars.
pub type ClientId = heapless::String<24>;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    // SAFETY: the buffer is exactly the 6 bytes the call writes.
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

/// Lowercase hex of all six MAC bytes, no separators.
pub fn client_id(mac: &MacAddress) -> ClientId {
    let mut id = ClientId::new();
    for byte in mac {
        // 12 chars always fit in 24.
        let _ = write!(id, "{:02x}", byte);
    }
    id
}

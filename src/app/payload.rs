//! JSON report bodies.
//!
//! Field names are part of the collector/broker contract and are kept
//! verbatim, including the differing patient id spellings of the two
//! node variants.

use serde::Serialize;

use crate::error::Result;

/// Body of a `glucose/level` GET response.
#[derive(Debug, Serialize)]
pub struct GlucoseReport {
    #[serde(rename = "patient_Id")]
    pub patient_id: u32,
    pub glucose_level: i32,
}

/// Body published on the cardio report topic.
#[derive(Debug, Serialize)]
pub struct CardioReport<'a> {
    #[serde(rename = "patientId")]
    pub patient_id: u32,
    pub client_id: &'a str,
    pub heart_rate: i32,
    pub blood_pressure: i32,
    /// `1` while the button pressed flag is set.
    pub button: u8,
}

/// Serialise a report body.
pub fn report_vital<T: Serialize>(report: &T) -> Result<String> {
    Ok(serde_json::to_string(report)?)
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_repr::Deserialize_repr;
use serde_with::skip_serializing_none;

/// GPS fix mode reported in TPV messages
///
/// Absence of a usable fix is an explicit state, never a zeroed position:
/// callers check the mode (and field presence) before acting on a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize_repr)]
#[repr(i32)]
pub enum FixMode {
    NotSeen = 0,
    NoFix = 1,
    Fix2D = 2,
    Fix3D = 3,
}

/// GPS fix status qualifier (plain GPS, DGPS, RTK, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize_repr)]
#[repr(i32)]
pub enum FixStatus {
    Unknown = 0,
    Gps = 1,
    /// with DGPS
    DGps = 2,
    /// with RTK Fixed
    RtkFixed = 3,
    /// with RTK Float
    RtkFloat = 4,
    /// with dead reckoning
    DR = 5,
    /// with GNSS + dead reckoning
    GnssDR = 6,
    /// time only (surveyed in, manual)
    Time = 7,
    /// simulated
    Simulated = 8,
    /// Precise Positioning Service
    PpsFix = 9,
}

/// Antenna status reported in TPV messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize_repr)]
#[repr(i32)]
pub enum AntennaStatus {
    Unknown = 0,
    Ok = 1,
    Open = 2,
    Short = 3,
}

/// GNSS constellation identifier for a satellite record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize_repr)]
#[repr(u8)]
pub enum GnssId {
    Gps = 0,
    Sbas = 1,
    Gal = 2,
    Bd = 3,
    Imes = 4,
    Qzss = 5,
    Glo = 6,
    Irnss = 7,
}

/// Satellite health flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize_repr)]
#[repr(u8)]
pub enum SatHealth {
    Unknown = 0,
    Ok = 1,
    Bad = 2,
}

bitflags::bitflags! {
    /// Data kinds seen on a device since gpsd opened it
    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    pub struct PropertyFlags: u32 {
        /// GPS data has been seen on this device
        const SEEN_GPS = 0x01;
        /// RTCM2 data has been seen on this device
        const SEEN_RTCM2 = 0x02;
        /// RTCM3 data has been seen on this device
        const SEEN_RTCM3 = 0x04;
        /// AIS data has been seen on this device
        const SEEN_AIS = 0x08;
    }
}

impl Serialize for PropertyFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u32(self.bits())
    }
}

impl<'de> Deserialize<'de> for PropertyFlags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u32::deserialize(deserializer)?;
        Ok(PropertyFlags::from_bits_truncate(bits))
    }
}

/// Serial parity setting, wire-coded as "N"/"O"/"E"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parity {
    No,
    Odd,
    Even,
}

impl Serialize for Parity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let s = match self {
            Parity::No => "N",
            Parity::Odd => "O",
            Parity::Even => "E",
        };
        serializer.serialize_str(s)
    }
}

impl<'de> Deserialize<'de> for Parity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let v = String::deserialize(deserializer)?;
        match v.as_str() {
            "N" => Ok(Parity::No),
            "O" => Ok(Parity::Odd),
            "E" => Ok(Parity::Even),
            _ => Err(serde::de::Error::custom(format!(
                "invalid Parity value: {}",
                v
            ))),
        }
    }
}

/// Dilution-of-precision block attached to SKY reports
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Dop {
    #[serde(rename = "xdop")]
    pub x: Option<f64>,
    #[serde(rename = "ydop")]
    pub y: Option<f64>,
    #[serde(rename = "pdop")]
    pub p: Option<f64>,
    #[serde(rename = "hdop")]
    pub h: Option<f64>,
    #[serde(rename = "vdop")]
    pub v: Option<f64>,
    #[serde(rename = "tdop")]
    pub t: Option<f64>,
    #[serde(rename = "gdop")]
    pub g: Option<f64>,
}

/// One satellite record inside a SKY report
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Satellite {
    #[serde(rename = "PRN")]
    pub prn: i16,
    #[serde(rename = "az")]
    pub azimuth: Option<f64>,
    #[serde(rename = "el")]
    pub elevation: Option<f64>,
    /// Signal strength in dB-Hz
    pub ss: Option<f64>,
    pub gnssid: Option<GnssId>,
    pub svid: Option<u8>,
    pub sigid: Option<u8>,
    pub health: Option<SatHealth>,
    /// Whether this satellite is used in the current solution
    pub used: bool,
}

/// GPS device descriptor
///
/// Appears both in DEVICE/DEVICES responses and, path-only, in outbound
/// `?DEVICE=` nudge commands.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub path: Option<String>,
    /// Activation time; gpsd has emitted this both as an ISO 8601 string
    /// and as a numeric Unix timestamp across releases
    #[serde(default, deserialize_with = "flexible_timestamp")]
    pub activated: Option<DateTime<Utc>>,
    pub flags: Option<PropertyFlags>,
    pub driver: Option<String>,
    pub sernum: Option<String>,
    pub subtype: Option<String>,
    pub subtype1: Option<String>,
    pub native: Option<i32>,
    pub bps: Option<i32>,
    pub parity: Option<Parity>,
    pub stopbits: Option<u32>,
    pub cycle: Option<f64>,
    pub mincycle: Option<f64>,
}

/// Watch policy object
///
/// Sent in `?WATCH=` commands and echoed back by the daemon as the
/// subscriber's current policy. All fields are optional; unset fields
/// leave the daemon-side setting untouched.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Watch {
    pub device: Option<String>,
    pub enable: Option<bool>,
    pub json: Option<bool>,
    pub nmea: Option<bool>,
    pub pps: Option<bool>,
    pub raw: Option<i32>,
    pub scaled: Option<bool>,
    pub split24: Option<bool>,
    pub timing: Option<bool>,
    pub remote: Option<String>,
}

/// Accepts either an RFC 3339 string or a fractional Unix timestamp
fn flexible_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(iso_time)) => DateTime::parse_from_rfc3339(&iso_time)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom),
        Some(serde_json::Value::Number(unix_time)) => Ok(unix_time.as_f64().and_then(|secs| {
            DateTime::<Utc>::from_timestamp(secs.trunc() as i64, (secs.fract() * 1e9) as u32)
        })),
        Some(_) => Err(serde::de::Error::custom(
            "invalid type for 'activated' field",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_flags_roundtrip() {
        let flags = PropertyFlags::SEEN_GPS | PropertyFlags::SEEN_AIS;
        let serialized = serde_json::to_string(&flags).unwrap();
        assert_eq!(serialized, "9");

        let deserialized: PropertyFlags = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, flags);
    }

    #[test]
    fn watch_policy_skips_unset_fields() {
        let watch = Watch {
            enable: Some(true),
            json: Some(true),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_string(&watch).unwrap(),
            r#"{"enable":true,"json":true}"#
        );
    }

    #[test]
    fn device_activated_accepts_both_timestamp_forms() {
        let iso: Device =
            serde_json::from_str(r#"{"path":"/dev/ttyUSB0","activated":"2022-03-01T09:15:00.000Z"}"#)
                .unwrap();
        let unix: Device =
            serde_json::from_str(r#"{"path":"/dev/ttyUSB0","activated":1646126100.0}"#).unwrap();
        assert_eq!(iso.activated, unix.activated);
        assert!(iso.activated.is_some());
    }

    #[test]
    fn parity_rejects_unknown_code() {
        assert!(serde_json::from_str::<Parity>(r#""X""#).is_err());
        assert_eq!(serde_json::from_str::<Parity>(r#""E""#).unwrap(), Parity::Even);
    }
}

//! GPSD protocol v3 response message types
//!
//! Every line the daemon emits is one JSON object identified by its "class"
//! field. This module models the classes this client consumes and the
//! closed [`Message`] union over them, plus the [`MessageKind`] discriminant
//! used for correlating synchronous commands with replies.
//!
//! All timestamps use ISO 8601 and are represented as `DateTime<Utc>`.
//! Numeric fields the daemon omits (or cannot compute) stay `None`; they
//! are never coerced to zero, because consumers test for presence before
//! acting. A track-point writer, for example, skips reports with unknown
//! altitude.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::types::*;

/// Time-Position-Velocity (TPV) report
///
/// The core GPS fix report. Position and error fields are present only
/// when the daemon could compute them for the current fix mode.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Tpv {
    /// Device path that provided this data
    pub device: Option<String>,
    /// GPS time of fix
    pub time: Option<DateTime<Utc>>,
    /// GPS fix mode (NoFix, 2D, 3D)
    pub mode: FixMode,
    /// GPS fix status (standard, DGPS, RTK, etc.)
    pub status: Option<FixStatus>,
    /// Latitude in degrees (positive = North)
    pub lat: Option<f64>,
    /// Longitude in degrees (positive = East)
    pub lon: Option<f64>,
    /// Altitude in meters (deprecated upstream, still emitted)
    pub alt: Option<f64>,
    /// Altitude, height above ellipsoid, in meters
    #[serde(rename = "altHAE")]
    pub alt_hae: Option<f64>,
    /// Altitude, mean sea level, in meters
    #[serde(rename = "altMSL")]
    pub alt_msl: Option<f64>,
    /// Antenna status (OK, OPEN, SHORT)
    pub ant: Option<AntennaStatus>,
    /// True track (course over ground) in degrees
    pub track: Option<f64>,
    /// Speed over ground in meters/second
    pub speed: Option<f64>,
    /// Climb/sink rate in meters per second
    pub climb: Option<f64>,
    /// Estimated time error in seconds
    pub ept: Option<f64>,
    /// Longitude error estimate in meters
    pub epx: Option<f64>,
    /// Latitude error estimate in meters
    pub epy: Option<f64>,
    /// Estimated vertical error in meters
    pub epv: Option<f64>,
    /// Estimated track error in degrees
    pub epd: Option<f64>,
    /// Estimated speed error in meters/second
    pub eps: Option<f64>,
    /// Estimated climb error in meters/second
    pub epc: Option<f64>,
    /// Estimated horizontal position error in meters
    pub eph: Option<f64>,
    /// Geoid separation in meters
    #[serde(rename = "geoidSep")]
    pub geoid_sep: Option<f64>,
    #[cfg(feature = "extra-fields")]
    /// Additional fields not explicitly defined
    #[serde(flatten)]
    extra: std::collections::HashMap<String, serde_json::Value>,
}

/// Satellite sky view (SKY) report
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Sky {
    /// Device path that provided this data
    pub device: Option<String>,
    /// GPS time of this sky view
    pub time: Option<DateTime<Utc>>,
    /// Dilution of precision values (flattened)
    #[serde(flatten)]
    pub dop: Option<Dop>,
    /// Number of satellites visible
    #[serde(rename = "nSat")]
    pub n_sat: Option<i32>,
    /// Number of satellites used in the navigation solution
    #[serde(rename = "uSat")]
    pub u_sat: Option<i32>,
    /// Visible satellites with their properties
    #[serde(default)]
    pub satellites: Vec<Satellite>,
    #[cfg(feature = "extra-fields")]
    /// Additional fields not explicitly defined
    #[serde(flatten)]
    extra: std::collections::HashMap<String, serde_json::Value>,
}

/// Attitude (ATT) report from receivers with orientation sensors
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Attitude {
    pub device: Option<String>,
    pub time: Option<DateTime<Utc>>,
    /// Heading in degrees from true north
    pub heading: Option<f64>,
    pub pitch: Option<f64>,
    pub roll: Option<f64>,
    pub yaw: Option<f64>,
    /// Magnetic dip in degrees
    pub dip: Option<f64>,
    pub mag_x: Option<f64>,
    pub mag_y: Option<f64>,
    pub mag_z: Option<f64>,
    pub acc_x: Option<f64>,
    pub acc_y: Option<f64>,
    pub acc_z: Option<f64>,
    /// Water depth in meters
    pub depth: Option<f64>,
    /// Temperature in degrees Celsius
    pub temp: Option<f64>,
}

/// GPS navigation subframe (SUBFRAME) report
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Subframe {
    /// Device path that provided this data
    pub device: Option<String>,
    /// Satellite the subframe was received from
    #[serde(rename = "tSV")]
    pub satellite: Option<i32>,
    /// Subframe number
    pub frame: Option<i32>,
    /// Time of week when the subframe started arriving
    #[serde(rename = "TOW17")]
    pub tow17: Option<i64>,
    /// Whether subframe fields are dumped in scaled form
    pub scaled: Option<bool>,
}

/// List of GPS devices known to the daemon (DEVICES)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeviceList {
    /// Available GPS devices
    pub devices: Vec<Device>,
}

/// Poll snapshot (POLL) with the most recent fixes from all active devices
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Poll {
    /// Number of active devices
    pub active: Option<i32>,
    /// Timestamp of this poll
    pub time: Option<DateTime<Utc>>,
    /// TPV data from active devices
    #[serde(default)]
    pub tpv: Vec<Tpv>,
    /// Sky views from active devices
    #[serde(default)]
    pub sky: Vec<Sky>,
}

/// Daemon version information (VERSION)
///
/// Also pushed unsolicited by the daemon as a greeting when a connection
/// is first established.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Version {
    /// gpsd release version string
    pub release: String,
    /// Git revision hash
    pub rev: Option<String>,
    /// Protocol major version number
    pub proto_major: Option<i32>,
    /// Protocol minor version number
    pub proto_minor: Option<i32>,
    /// Remote server URL (if proxied)
    pub remote: Option<String>,
}

/// Error notification (ERROR) from the daemon
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Error {
    /// Error message text
    pub message: String,
}

/// GPSD response message union
///
/// Exactly one variant per decoded line; the variant is selected by the
/// JSON "class" field. Unknown classes never reach this enum, because the
/// decoder rejects them first (see [`super::decode_line`]).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "class", rename_all = "UPPERCASE")]
pub enum Message {
    /// Time-Position-Velocity report
    Tpv(Tpv),
    /// Satellite sky view report
    Sky(Sky),
    /// Attitude/orientation report
    Att(Attitude),
    /// GPS navigation subframe report
    Subframe(Subframe),
    /// List of available GPS devices
    Devices(DeviceList),
    /// Single GPS device descriptor
    Device(Device),
    /// Current watch policy
    Watch(Watch),
    /// Poll snapshot with current fixes
    Poll(Poll),
    /// Daemon version information
    Version(Version),
    /// Error message from the daemon
    Error(Error),
}

/// The set of "class" discriminators [`Message`] can decode
pub(crate) const KNOWN_CLASSES: &[&str] = &[
    "TPV", "SKY", "ATT", "SUBFRAME", "DEVICES", "DEVICE", "WATCH", "POLL", "VERSION", "ERROR",
];

/// Field-less discriminant of [`Message`], used for reply correlation
///
/// The protocol carries no request identifiers, so a synchronous caller
/// names the kind it expects and the endpoint matches replies by kind
/// alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Tpv,
    Sky,
    Att,
    Subframe,
    Devices,
    Device,
    Watch,
    Poll,
    Version,
    Error,
}

impl MessageKind {
    /// Whether this kind is an unsolicited report pushed by the daemon
    ///
    /// Event kinds always go to registered observers; every other kind is
    /// treated as the reply to whatever synchronous command is in flight.
    pub fn is_event(self) -> bool {
        matches!(
            self,
            MessageKind::Tpv
                | MessageKind::Sky
                | MessageKind::Att
                | MessageKind::Subframe
                | MessageKind::Devices
                | MessageKind::Device
        )
    }
}

impl Message {
    /// Returns the discriminant of this message
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Tpv(_) => MessageKind::Tpv,
            Message::Sky(_) => MessageKind::Sky,
            Message::Att(_) => MessageKind::Att,
            Message::Subframe(_) => MessageKind::Subframe,
            Message::Devices(_) => MessageKind::Devices,
            Message::Device(_) => MessageKind::Device,
            Message::Watch(_) => MessageKind::Watch,
            Message::Poll(_) => MessageKind::Poll,
            Message::Version(_) => MessageKind::Version,
            Message::Error(_) => MessageKind::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::v3::decode_line;
    use crate::error::GpsdClientError;

    #[test]
    fn decodes_tpv_with_full_fix() {
        let line = r#"{"class":"TPV","device":"/dev/ttyUSB0","mode":3,"time":"2022-03-01T09:15:00.000Z","lat":48.117,"lon":11.517,"alt":545.2,"speed":2.5}"#;
        let msg = decode_line(line).unwrap();
        assert_eq!(msg.kind(), MessageKind::Tpv);
        let Message::Tpv(tpv) = msg else {
            panic!("expected TPV variant");
        };
        assert_eq!(tpv.mode, FixMode::Fix3D);
        assert_eq!(tpv.lat, Some(48.117));
        assert_eq!(tpv.lon, Some(11.517));
        assert_eq!(tpv.alt, Some(545.2));
    }

    #[test]
    fn decodes_antenna_status() {
        let line = r#"{"class":"TPV","mode":3,"lat":1.0,"lon":2.0,"ant":2}"#;
        let Message::Tpv(tpv) = decode_line(line).unwrap() else {
            panic!("expected TPV variant");
        };
        assert_eq!(tpv.ant, Some(AntennaStatus::Open));

        let line = r#"{"class":"TPV","mode":2,"lat":1.0,"lon":2.0}"#;
        let Message::Tpv(tpv) = decode_line(line).unwrap() else {
            panic!("expected TPV variant");
        };
        assert_eq!(tpv.ant, None);
    }

    #[test]
    fn absent_altitude_stays_unknown() {
        let line = r#"{"class":"TPV","mode":2,"lat":1.0,"lon":2.0}"#;
        let Message::Tpv(tpv) = decode_line(line).unwrap() else {
            panic!("expected TPV variant");
        };
        assert_eq!(tpv.mode, FixMode::Fix2D);
        assert_eq!(tpv.alt, None);
        assert_eq!(tpv.alt_msl, None);
    }

    #[test]
    fn decodes_sky_satellite_list() {
        let line = r#"{"class":"SKY","hdop":1.2,"nSat":4,"uSat":3,"satellites":[{"PRN":12,"el":45.0,"az":180.0,"ss":38.0,"used":true},{"PRN":3,"used":false}]}"#;
        let Message::Sky(sky) = decode_line(line).unwrap() else {
            panic!("expected SKY variant");
        };
        assert_eq!(sky.satellites.len(), 2);
        assert!(sky.satellites[0].used);
        assert_eq!(sky.dop.as_ref().and_then(|d| d.h), Some(1.2));
    }

    #[test]
    fn decodes_version_greeting() {
        let line = r#"{"class":"VERSION","release":"3.20","rev":"3.20","proto_major":3,"proto_minor":14}"#;
        let Message::Version(version) = decode_line(line).unwrap() else {
            panic!("expected VERSION variant");
        };
        assert_eq!(version.release, "3.20");
        assert_eq!(version.proto_major, Some(3));
    }

    #[test]
    fn decodes_watch_policy_echo() {
        let line = r#"{"class":"WATCH","enable":true,"json":true,"nmea":false}"#;
        let msg = decode_line(line).unwrap();
        assert_eq!(msg.kind(), MessageKind::Watch);
        assert!(!msg.kind().is_event());
    }

    #[test]
    fn decodes_devices_and_subframe_as_events() {
        let devices = r#"{"class":"DEVICES","devices":[{"path":"/dev/ttyUSB0","driver":"NMEA0183"}]}"#;
        let subframe = r#"{"class":"SUBFRAME","device":"/dev/ttyUSB0","tSV":18,"frame":2,"TOW17":271794}"#;
        assert!(decode_line(devices).unwrap().kind().is_event());
        assert!(decode_line(subframe).unwrap().kind().is_event());
    }

    #[test]
    fn decodes_poll_snapshot() {
        let line = r#"{"class":"POLL","active":1,"tpv":[{"class":"TPV","mode":3,"lat":1.0,"lon":2.0}],"sky":[]}"#;
        let Message::Poll(poll) = decode_line(line).unwrap() else {
            panic!("expected POLL variant");
        };
        assert_eq!(poll.active, Some(1));
        assert_eq!(poll.tpv.len(), 1);
    }

    #[test]
    fn unknown_class_is_a_typed_failure() {
        let line = r#"{"class":"AIVDM","type":1}"#;
        match decode_line(line) {
            Err(GpsdClientError::UnknownKind { class, .. }) => assert_eq!(class, "AIVDM"),
            other => panic!("expected UnknownKind, got {:?}", other),
        }
    }

    #[test]
    fn missing_class_is_a_typed_failure() {
        let line = r#"{"lat":1.0,"lon":2.0}"#;
        assert!(matches!(
            decode_line(line),
            Err(GpsdClientError::MissingClass(_))
        ));
    }

    #[test]
    fn malformed_json_is_a_typed_failure() {
        assert!(matches!(
            decode_line("{not json"),
            Err(GpsdClientError::Serde(_))
        ));
    }

    #[test]
    fn event_and_reply_kinds_partition_the_union() {
        assert!(MessageKind::Tpv.is_event());
        assert!(MessageKind::Device.is_event());
        assert!(!MessageKind::Watch.is_event());
        assert!(!MessageKind::Poll.is_event());
        assert!(!MessageKind::Version.is_event());
        assert!(!MessageKind::Error.is_event());
    }
}

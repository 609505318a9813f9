use crate::protocol::GpsdRequest;

use super::types::*;

/// Outbound command set for protocol v3
///
/// `Watch` with a policy body is the session-mode command the endpoint
/// remembers and replays after a reconnect.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Devices,
    Watch(Option<Watch>),
    Device(Option<Device>),
    Poll,
    Version,
}

impl GpsdRequest for Message {
    /// Renders the command according to the GPSD wire grammar:
    /// `?COMMAND;` for bodiless commands, `?COMMAND={json};` otherwise.
    fn to_command(&self) -> String {
        match self {
            Message::Devices => "?DEVICES;".into(),
            Message::Watch(Some(watch)) => {
                format!("?WATCH={};", serde_json::to_string(watch).unwrap())
            }
            Message::Watch(None) => "?WATCH;".into(),
            Message::Device(Some(device)) => {
                format!("?DEVICE={};", serde_json::to_string(device).unwrap())
            }
            Message::Device(None) => "?DEVICE;".into(),
            Message::Poll => "?POLL;".into(),
            Message::Version => "?VERSION;".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bodiless_commands_render_bare() {
        assert_eq!(Message::Poll.to_command(), "?POLL;");
        assert_eq!(Message::Version.to_command(), "?VERSION;");
        assert_eq!(Message::Devices.to_command(), "?DEVICES;");
        assert_eq!(Message::Watch(None).to_command(), "?WATCH;");
    }

    #[test]
    fn watch_command_carries_policy_json() {
        let watch = Watch {
            enable: Some(true),
            json: Some(true),
            device: Some("/dev/ttyUSB0".into()),
            ..Default::default()
        };
        assert_eq!(
            Message::Watch(Some(watch)).to_command(),
            r#"?WATCH={"device":"/dev/ttyUSB0","enable":true,"json":true};"#
        );
    }

    #[test]
    fn device_nudge_carries_only_the_path() {
        let device = Device {
            path: Some("/dev/ttyUSB0".into()),
            ..Default::default()
        };
        assert_eq!(
            Message::Device(Some(device)).to_command(),
            r#"?DEVICE={"path":"/dev/ttyUSB0"};"#
        );
    }
}

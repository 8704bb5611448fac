/*!
 * Bluetooth Device Operations
 * blueutil operations and observed device state
 */

pub mod batch;
pub mod command;

#[cfg(test)]
pub(crate) mod testing;

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::DeviceConfig;

pub use batch::{BatchOperator, BatchResults};
pub use command::{CommandRunner, ProcessRunner};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    IsConnected,
    Pair,
    Unpair,
    Connect,
    Disconnect,
    Info,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown operation {0:?}, expected one of: unpair, pair, connect, disconnect, info, isConnected")]
pub struct UnknownOperation(pub String);

impl Operation {
    /// Logged once at the start of every batch.
    pub fn label(&self) -> &'static str {
        match self {
            Operation::IsConnected => "Checking connection",
            Operation::Pair => "Pairing",
            Operation::Unpair => "Unpairing",
            Operation::Connect => "Connecting",
            Operation::Disconnect => "Disconnecting",
            Operation::Info => "Gathering Info",
        }
    }

    pub fn flag(&self) -> &'static str {
        match self {
            Operation::IsConnected => "--is-connected",
            Operation::Pair => "--pair",
            Operation::Unpair => "--unpair",
            Operation::Connect => "--connect",
            Operation::Disconnect => "--disconnect",
            Operation::Info => "--info",
        }
    }

    pub fn args(&self, address: &str) -> Vec<String> {
        vec![self.flag().to_string(), address.to_string()]
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::IsConnected => "isConnected",
            Operation::Pair => "pair",
            Operation::Unpair => "unpair",
            Operation::Connect => "connect",
            Operation::Disconnect => "disconnect",
            Operation::Info => "info",
        };

        write!(f, "{}", name)
    }
}

impl FromStr for Operation {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "isConnected" | "is-connected" => Ok(Operation::IsConnected),
            "pair" => Ok(Operation::Pair),
            "unpair" => Ok(Operation::Unpair),
            "connect" => Ok(Operation::Connect),
            "disconnect" => Ok(Operation::Disconnect),
            "info" => Ok(Operation::Info),
            other => Err(UnknownOperation(other.to_string())),
        }
    }
}

/// A configured device plus the connection flag seen by the latest check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceStatus {
    pub address: String,
    pub name: String,
    /// `None` when the check failed for this device
    pub connected: Option<bool>,
}

impl DeviceStatus {
    pub fn unchecked(device: &DeviceConfig) -> Self {
        Self {
            address: device.address.clone(),
            name: device.name.clone(),
            connected: None,
        }
    }
}

/// Snapshot produced by one connection check, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceTable {
    pub devices: Vec<DeviceStatus>,
}

impl DeviceTable {
    pub fn connected_count(&self) -> usize {
        self.devices.iter().filter(|d| d.connected == Some(true)).count()
    }
}

impl fmt::Display for DeviceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name_width = self.devices.iter().map(|d| d.name.chars().count()).max().unwrap_or(0);

        for device in &self.devices {
            let connected = match device.connected {
                Some(true) => "true",
                Some(false) => "false",
                None => "unknown",
            };
            writeln!(
                f,
                "{}  {:<width$}  connected: {}",
                device.address,
                device.name,
                connected,
                width = name_width
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_operation_name() {
        let all = [
            Operation::IsConnected,
            Operation::Pair,
            Operation::Unpair,
            Operation::Connect,
            Operation::Disconnect,
            Operation::Info,
        ];
        for operation in all {
            assert_eq!(operation.to_string().parse::<Operation>(), Ok(operation));
        }
        assert_eq!("is-connected".parse::<Operation>(), Ok(Operation::IsConnected));
    }

    #[test]
    fn unknown_operation_is_rejected_with_its_name() {
        let err = "reboot".parse::<Operation>().unwrap_err();
        assert_eq!(err, UnknownOperation("reboot".to_string()));
        assert!(err.to_string().starts_with("Unknown operation \"reboot\""));

        assert!("IsConnected".parse::<Operation>().is_err());
        assert!("".parse::<Operation>().is_err());
    }

    #[test]
    fn builds_blueutil_arguments() {
        assert_eq!(
            Operation::IsConnected.args("88-4d-7c-ef-e7-42"),
            vec!["--is-connected", "88-4d-7c-ef-e7-42"]
        );
        assert_eq!(Operation::Unpair.args("x"), vec!["--unpair", "x"]);
        assert_eq!(Operation::Info.label(), "Gathering Info");
    }

    #[test]
    fn table_lists_devices_in_order() {
        let table = DeviceTable {
            devices: vec![
                DeviceStatus {
                    address: "aa-bb-cc-dd-ee-01".to_string(),
                    name: "Keyboard".to_string(),
                    connected: Some(true),
                },
                DeviceStatus {
                    address: "aa-bb-cc-dd-ee-02".to_string(),
                    name: "Mouse".to_string(),
                    connected: None,
                },
            ],
        };

        assert_eq!(
            table.to_string(),
            "aa-bb-cc-dd-ee-01  Keyboard  connected: true\n\
             aa-bb-cc-dd-ee-02  Mouse     connected: unknown\n"
        );
        assert_eq!(table.connected_count(), 1);
    }
}

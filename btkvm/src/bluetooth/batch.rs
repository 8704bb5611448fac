/*!
 * Device Batch Operator
 * Applies one operation to every configured device, one at a time
 */

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use super::command::{CommandError, CommandOutput, CommandRunner};
use super::{DeviceStatus, DeviceTable, Operation};
use crate::config::{DeviceConfig, SwapConfig};

/// Output of every device whose command succeeded, keyed by address in configuration order.
/// A device missing from the map failed.
pub type BatchResults = IndexMap<String, CommandOutput>;

pub struct BatchOperator<R> {
    tool: String,
    devices: Vec<DeviceConfig>,
    runner: R,
}

impl<R: CommandRunner> BatchOperator<R> {
    pub fn new(config: &SwapConfig, runner: R) -> Self {
        Self {
            tool: config.tool.clone(),
            devices: config.devices.clone(),
            runner,
        }
    }

    pub fn devices(&self) -> &[DeviceConfig] {
        &self.devices
    }

    #[cfg(test)]
    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub async fn run(&self, operation: Operation) -> BatchResults {
        info!("{}", operation.label());

        let mut results = BatchResults::new();
        for device in &self.devices {
            let args = operation.args(&device.address);

            match self.runner.run(&self.tool, &args).await {
                Ok(output) => {
                    results.insert(device.address.clone(), output);
                }
                Err(err) => {
                    warn!(
                        "{} failed for {} ({}): {}",
                        operation,
                        device.name,
                        device.address,
                        err
                    );
                    if let CommandError::Exit { stdout, .. } = &err {
                        if !stdout.trim().is_empty() {
                            debug!("{} stdout: {}", device.address, stdout.trim());
                        }
                    }
                }
            }
        }

        results
    }

    /// Runs an `isConnected` batch and builds a fresh table from its output.
    pub async fn check_connections(&self) -> DeviceTable {
        let results = self.run(Operation::IsConnected).await;
        connection_table(&self.devices, &results)
    }
}

pub fn connection_table(devices: &[DeviceConfig], results: &BatchResults) -> DeviceTable {
    let devices = devices
        .iter()
        .map(|device| {
            let mut status = DeviceStatus::unchecked(device);
            status.connected = results
                .get(&device.address)
                .map(|output| output.stdout.trim() == "1");
            status
        })
        .collect();

    DeviceTable { devices }
}

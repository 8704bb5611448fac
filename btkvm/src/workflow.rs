/*!
 * Workflow Sequencer
 * attach, detach and report, built from device batches
 */

use std::time::Duration;
use tracing::debug;

use crate::bluetooth::{BatchOperator, BatchResults, CommandRunner, DeviceTable, Operation};
use crate::config::{SettleDelays, SwapConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workflow {
    /// Take the devices over from the other host
    Attach,
    /// Release the devices so the other host can attach them
    Detach,
    Report,
}

impl Workflow {
    /// Anything other than `attach` or `detach` falls back to a status report.
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            Some("attach") => Workflow::Attach,
            Some("detach") => Workflow::Detach,
            Some(other) => {
                debug!("Unrecognized workflow {:?}, reporting status", other);
                Workflow::Report
            }
            None => Workflow::Report,
        }
    }
}

pub struct Sequencer<R> {
    operator: BatchOperator<R>,
    settle: SettleDelays,
}

impl<R: CommandRunner> Sequencer<R> {
    pub fn new(config: &SwapConfig, runner: R) -> Self {
        Self {
            operator: BatchOperator::new(config, runner),
            settle: config.settle,
        }
    }

    pub fn operator(&self) -> &BatchOperator<R> {
        &self.operator
    }

    pub async fn run(&self, workflow: Workflow) -> DeviceTable {
        match workflow {
            Workflow::Attach => self.attach().await,
            Workflow::Detach => self.detach().await,
            Workflow::Report => self.report().await,
        }
    }

    pub async fn attach(&self) -> DeviceTable {
        self.operator.run(Operation::Unpair).await;
        settle(self.settle.after_unpair()).await;

        self.operator.run(Operation::Pair).await;
        settle(self.settle.after_pair()).await;

        self.operator.run(Operation::Connect).await;
        settle(self.settle.after_connect()).await;

        self.report().await
    }

    pub async fn detach(&self) -> DeviceTable {
        self.operator.run(Operation::Unpair).await;
        settle(self.settle.after_unpair()).await;

        self.report().await
    }

    pub async fn report(&self) -> DeviceTable {
        self.operator.check_connections().await
    }

    /// One batch of any operation, outside of the named workflows.
    pub async fn run_single(&self, operation: Operation) -> BatchResults {
        self.operator.run(operation).await
    }
}

async fn settle(delay: Duration) {
    if delay.is_zero() {
        return;
    }
    debug!("Waiting {:?} for the bluetooth stack to settle", delay);
    tokio::time::sleep(delay).await;
}

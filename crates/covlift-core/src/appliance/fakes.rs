//! In-memory appliance fake (testing only)

use std::sync::Mutex;

use async_trait::async_trait;

use crate::appliance::Appliance;
use crate::error::HarvestResult;
use crate::version::ApplianceVersion;

/// Appliance that records which operations were invoked.
pub struct FakeAppliance {
    version: ApplianceVersion,
    calls: Mutex<Vec<&'static str>>,
}

impl FakeAppliance {
    pub fn new(version: ApplianceVersion) -> Self {
        FakeAppliance {
            version,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Operation names in invocation order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Appliance for FakeAppliance {
    async fn version(&self) -> HarvestResult<ApplianceVersion> {
        self.calls.lock().unwrap().push("version");
        Ok(self.version.clone())
    }

    async fn stop_server(&self) -> HarvestResult<()> {
        self.calls.lock().unwrap().push("stop_server");
        Ok(())
    }

    async fn install_coverage_tools(&self) -> HarvestResult<()> {
        self.calls.lock().unwrap().push("install_coverage_tools");
        Ok(())
    }
}

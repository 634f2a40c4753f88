//! Client for the proposal metadata service (the Snapshot hub).
//!
//! Only used by verification flows that must locate which module contract
//! governs a given space. Resolution failures surface as errors; a guessed
//! module address would derive a digest that matches nothing.

use std::str::FromStr;

use ethers::types::Address;
use serde_json::Value;

use crate::errors::VerifyError;
use crate::normalize::PLUGIN_SECTIONS;

pub struct SnapshotHub {
    base_url: String,
    client: reqwest::Client,
}

impl SnapshotHub {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Resolves the module contract address configured for `space`.
    pub async fn resolve_module_address(&self, space: &str) -> Result<Address, VerifyError> {
        let url = format!("{}/api/spaces/{}", self.base_url, space);

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|err| VerifyError::external("resolveModuleAddress", err))?;
        let settings = resp
            .json::<Value>()
            .await
            .map_err(|err| VerifyError::external("resolveModuleAddress", err))?;

        let address = PLUGIN_SECTIONS
            .iter()
            .find_map(|name| {
                settings
                    .pointer(&format!("/plugins/{name}/address"))
                    .and_then(Value::as_str)
            })
            .ok_or_else(|| {
                VerifyError::external(
                    "resolveModuleAddress",
                    format!("no module address configured for space `{space}`"),
                )
            })?;

        Address::from_str(address).map_err(|_| {
            VerifyError::external(
                "resolveModuleAddress",
                format!("space `{space}` reports invalid module address `{address}`"),
            )
        })
    }
}

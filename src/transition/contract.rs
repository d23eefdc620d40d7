use crate::foundation::error::{TesselError, TesselResult};

/// What to do when an option breaks a transition contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContractMode {
    /// Fail the pass with [`TesselError::Contract`].
    Strict,
    /// Log a warning and skip the offending key.
    Lenient,
}

impl Default for ContractMode {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Strict
        } else {
            Self::Lenient
        }
    }
}

impl ContractMode {
    /// Report a violation. `Ok(())` means the caller should skip the key and carry on.
    pub(crate) fn violation(self, msg: impl Into<String>) -> TesselResult<()> {
        let msg = msg.into();
        match self {
            Self::Strict => Err(TesselError::contract(msg)),
            Self::Lenient => {
                tracing::warn!(%msg, "contract violation skipped");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transition/contract.rs"]
mod tests;

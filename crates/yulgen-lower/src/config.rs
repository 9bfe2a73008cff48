use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target EVM revision. Later revisions are strictly more capable.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum EvmVersion {
    Homestead,
    TangerineWhistle,
    SpuriousDragon,
    Byzantium,
    Constantinople,
    Petersburg,
    #[default]
    Istanbul,
}

impl EvmVersion {
    pub const ALL: [EvmVersion; 7] = [
        EvmVersion::Homestead,
        EvmVersion::TangerineWhistle,
        EvmVersion::SpuriousDragon,
        EvmVersion::Byzantium,
        EvmVersion::Constantinople,
        EvmVersion::Petersburg,
        EvmVersion::Istanbul,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EvmVersion::Homestead => "homestead",
            EvmVersion::TangerineWhistle => "tangerineWhistle",
            EvmVersion::SpuriousDragon => "spuriousDragon",
            EvmVersion::Byzantium => "byzantium",
            EvmVersion::Constantinople => "constantinople",
            EvmVersion::Petersburg => "petersburg",
            EvmVersion::Istanbul => "istanbul",
        }
    }

    pub fn has_static_call(&self) -> bool {
        *self >= EvmVersion::Byzantium
    }

    pub fn supports_returndata(&self) -> bool {
        *self >= EvmVersion::Byzantium
    }

    pub fn has_bitwise_shifting(&self) -> bool {
        *self >= EvmVersion::Constantinople
    }

    /// Whether a call may request more gas than is available and receive all of it.
    pub fn can_overcharge_gas_for_call(&self) -> bool {
        *self >= EvmVersion::TangerineWhistle
    }

    /// Base cost of the `CALL` family.
    pub fn call_gas(&self) -> u64 {
        if *self >= EvmVersion::TangerineWhistle {
            700
        } else {
            40
        }
    }
}

pub const CALL_VALUE_TRANSFER_GAS: u64 = 9000;
pub const CALL_NEW_ACCOUNT_GAS: u64 = 25000;

impl fmt::Display for EvmVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for EvmVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EvmVersion::ALL
            .iter()
            .find(|version| version.name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| format!("Unknown EVM version: {}", s))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorConfig {
    #[serde(default)]
    pub evm_version: EvmVersion,
}

impl GeneratorConfig {
    pub fn for_evm(evm_version: EvmVersion) -> Self {
        Self { evm_version }
    }
}

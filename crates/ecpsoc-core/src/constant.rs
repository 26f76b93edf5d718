//! Build-time constants exported to the firmware build.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Value of a build constant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstantValue {
    Int(u64),
    Str(String),
}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantValue::Int(v) => write!(f, "0x{v:08x}"),
            ConstantValue::Str(s) => write!(f, "\"{s}\""),
        }
    }
}

/// A named constant such as `FLASH_BOOT_ADDRESS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConstant {
    pub name: String,
    pub value: ConstantValue,
}

impl BuildConstant {
    pub fn int(name: impl Into<String>, value: u64) -> Self {
        Self {
            name: name.into(),
            value: ConstantValue::Int(value),
        }
    }

    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: ConstantValue::Str(value.into()),
        }
    }

    pub fn as_int(&self) -> Option<u64> {
        match self.value {
            ConstantValue::Int(v) => Some(v),
            ConstantValue::Str(_) => None,
        }
    }
}

// Karacfg Devices
// Device identification predicates used to scope rules

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Identifying properties of an input device.
///
/// Only the fields that are set take part in matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceIdentifiers {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_keyboard: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_pointing_device: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_built_in_keyboard: Option<bool>,
}

impl DeviceIdentifiers {
    /// Identify a device by vendor and product id
    pub fn new(vendor_id: u32, product_id: u32) -> Self {
        Self {
            vendor_id: Some(vendor_id),
            product_id: Some(product_id),
            ..Self::default()
        }
    }

    /// Identify every device of one vendor
    pub fn vendor(vendor_id: u32) -> Self {
        Self {
            vendor_id: Some(vendor_id),
            ..Self::default()
        }
    }

    /// Identify the built-in keyboard
    pub fn built_in() -> Self {
        Self {
            is_built_in_keyboard: Some(true),
            ..Self::default()
        }
    }

    /// Identifiers for the profile's device list.
    ///
    /// Unset keyboard/pointing flags default to `true` so the host picks up
    /// both kinds of events from the device.
    pub fn for_profile(&self) -> Self {
        Self {
            is_keyboard: Some(self.is_keyboard.unwrap_or(true)),
            is_pointing_device: Some(self.is_pointing_device.unwrap_or(true)),
            ..self.clone()
        }
    }
}

/// How a device predicate is applied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DevicePolarity {
    /// Only events from the device match
    #[default]
    If,
    /// Events from every other device match
    Unless,
    /// Matches while the device is connected
    ExistsIf,
    /// Matches while the device is not connected
    ExistsUnless,
}

impl DevicePolarity {
    /// Condition type written for this polarity
    pub fn condition_type(self) -> &'static str {
        match self {
            DevicePolarity::If => "device_if",
            DevicePolarity::Unless => "device_unless",
            DevicePolarity::ExistsIf => "device_exists_if",
            DevicePolarity::ExistsUnless => "device_exists_unless",
        }
    }
}

/// A device declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Device {
    pub identifiers: DeviceIdentifiers,
    pub polarity: DevicePolarity,
    /// Ask the host to leave this device's events alone
    pub ignore: bool,
}

impl Device {
    pub fn new(identifiers: DeviceIdentifiers) -> Self {
        Self {
            identifiers,
            polarity: DevicePolarity::If,
            ignore: false,
        }
    }

    pub fn polarity(mut self, polarity: DevicePolarity) -> Self {
        self.polarity = polarity;
        self
    }

    pub fn unless(self) -> Self {
        self.polarity(DevicePolarity::Unless)
    }

    pub fn exists_if(self) -> Self {
        self.polarity(DevicePolarity::ExistsIf)
    }

    pub fn exists_unless(self) -> Self {
        self.polarity(DevicePolarity::ExistsUnless)
    }

    pub fn ignore(mut self, ignore: bool) -> Self {
        self.ignore = ignore;
        self
    }
}

impl From<DeviceIdentifiers> for Device {
    fn from(identifiers: DeviceIdentifiers) -> Self {
        Device::new(identifiers)
    }
}

/// Handle to a device declared on a [`crate::Config`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub(crate) usize);

impl DeviceId {
    pub fn index(self) -> usize {
        self.0
    }
}

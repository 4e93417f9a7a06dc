//! Typed builders for SMAPI operations.
//!
//! Each operation knows its API name, the kind of change it makes (which
//! selects the catalog entry) and how to render its command text.

use std::fmt;

use crate::OpKind;

/// A declarative SMAPI operation.
pub trait Operation {
    /// SMAPI function name.
    fn api_name(&self) -> &'static str;

    /// Kind of change, used to pick benign messages.
    fn operation(&self) -> OpKind;

    /// Parameters sent after the target.
    fn command_text(&self) -> String;
}

/// Virtual NIC device type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum NicType {
    /// QDIO (OSA-Express simulation).
    Qdio,
    /// HiperSockets simulation.
    #[default]
    Hiper,
}

impl fmt::Display for NicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Qdio => "QDIO",
            Self::Hiper => "HIPER",
        })
    }
}

/// Owner used when a LAN is named without one.
pub const DEFAULT_LAN_OWNER: &str = "SYSTEM";

/// Adds or removes a NICDEF statement in a directory entry (`Dirm_Nicdef`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NicDef {
    /// Virtual device number.
    devno: String,
    /// `None` deletes the NIC.
    define: Option<NicSpec>,
}

/// NIC attributes for a definition.
#[derive(Debug, Clone, PartialEq, Eq)]
struct NicSpec {
    /// Device type.
    nic_type: NicType,
    /// `(owner, name)` of the guest LAN or VSwitch to couple to.
    lan: Option<(String, String)>,
    /// VLAN ID.
    vlan: Option<String>,
    /// MAC suffix.
    mac_id: Option<String>,
}

impl NicDef {
    /// Defines a NIC at `devno`.
    pub fn define(devno: impl Into<String>, nic_type: NicType) -> Self {
        Self {
            devno: devno.into(),
            define: Some(NicSpec {
                nic_type,
                lan: None,
                vlan: None,
                mac_id: None,
            }),
        }
    }

    /// Deletes the NIC at `devno`.
    pub fn delete(devno: impl Into<String>) -> Self {
        Self {
            devno: devno.into(),
            define: None,
        }
    }

    /// Couples the NIC to LAN `name` owned by `owner` (default `SYSTEM`).
    ///
    /// Ignored for deletes.
    pub fn lan(mut self, owner: Option<String>, name: impl Into<String>) -> Self {
        if let Some(spec) = &mut self.define {
            let owner = owner.unwrap_or_else(|| DEFAULT_LAN_OWNER.to_owned());
            spec.lan = Some((owner, name.into()));
        }
        self
    }

    /// Sets the VLAN ID. Ignored for deletes.
    pub fn vlan(mut self, vlan: impl Into<String>) -> Self {
        if let Some(spec) = &mut self.define {
            spec.vlan = Some(vlan.into());
        }
        self
    }

    /// Sets the MAC ID. Ignored for deletes.
    pub fn mac_id(mut self, mac_id: impl Into<String>) -> Self {
        if let Some(spec) = &mut self.define {
            spec.mac_id = Some(mac_id.into());
        }
        self
    }
}

impl Operation for NicDef {
    fn api_name(&self) -> &'static str {
        "Dirm_Nicdef"
    }

    fn operation(&self) -> OpKind {
        if self.define.is_some() {
            OpKind::Create
        } else {
            OpKind::Delete
        }
    }

    fn command_text(&self) -> String {
        let Some(spec) = &self.define else {
            return format!("{} DELETE", self.devno);
        };
        let mut text = format!("{} TYPE {}", self.devno, spec.nic_type);
        if let Some((owner, name)) = &spec.lan {
            text.push_str(&format!(" LAN {owner} {name}"));
        }
        if let Some(vlan) = &spec.vlan {
            text.push_str(&format!(" VLAN {vlan}"));
        }
        if let Some(mac) = &spec.mac_id {
            text.push_str(&format!(" MACID {mac}"));
        }
        text
    }
}

/// CP share type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ShareKind {
    /// Relative share (`REL n`).
    Relative,
    /// Absolute share as a percentage (`ABS n%`).
    Absolute,
}

/// Sets a running guest's CPU share (`Cp_SetShare`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetShare {
    /// Share type.
    kind: ShareKind,
    /// Share value.
    value: u32,
}

impl SetShare {
    /// Creates a share setting.
    pub fn new(kind: ShareKind, value: u32) -> Self {
        Self { kind, value }
    }
}

impl Operation for SetShare {
    fn api_name(&self) -> &'static str {
        "Cp_SetShare"
    }

    fn operation(&self) -> OpKind {
        OpKind::Set
    }

    fn command_text(&self) -> String {
        match self.kind {
            ShareKind::Relative => format!("REL {}", self.value),
            ShareKind::Absolute => format!("ABS {}%", self.value),
        }
    }
}

//! SMAPI operation commands: call, nicdef, setshare.

use anyhow::Result;
use smapi::{
    Client, ErrorCatalog, NicDef, NicType, Operation, PlannedCall, Report, SetShare, ShareKind,
};

use crate::Command;

/// Arguments for `zvm-smapi call`.
#[derive(clap::Args)]
pub struct CallArgs {
    /// SMAPI function name (e.g. Image_Activate).
    #[arg(long)]
    pub api: String,

    /// Target image (guest user ID).
    #[arg(long)]
    pub target: String,

    /// Parameters sent after the target, passed verbatim.
    #[arg(allow_hyphen_values = true)]
    pub command_text: Option<String>,
}

/// NIC type accepted on the command line.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum NicTypeArg {
    /// QDIO (OSA-Express simulation).
    Qdio,
    /// HiperSockets simulation.
    #[default]
    Hiper,
}

/// Arguments for `zvm-smapi nicdef`.
#[derive(clap::Args)]
pub struct NicdefArgs {
    /// Target image (guest user ID).
    #[arg(long)]
    pub target: String,

    /// Virtual device number of the NIC.
    #[arg(long)]
    pub devno: String,

    /// NIC type.
    #[arg(long = "type", value_enum, default_value_t)]
    pub nic_type: NicTypeArg,

    /// Guest LAN or VSwitch to couple to.
    #[arg(long)]
    pub lan: Option<String>,

    /// Owner of the LAN (default: SYSTEM).
    #[arg(long, requires = "lan")]
    pub lan_owner: Option<String>,

    /// VLAN ID.
    #[arg(long)]
    pub vlan: Option<String>,

    /// MAC ID suffix.
    #[arg(long)]
    pub mac_id: Option<String>,

    /// Delete the NIC instead of defining it.
    #[arg(long, conflicts_with_all = ["lan", "vlan", "mac_id"])]
    pub absent: bool,
}

/// Share type accepted on the command line.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ShareArg {
    /// Relative share.
    Rel,
    /// Absolute share, in percent.
    Abs,
}

/// Arguments for `zvm-smapi setshare`.
#[derive(clap::Args)]
pub struct SetshareArgs {
    /// Target image (guest user ID).
    #[arg(long)]
    pub target: String,

    /// Share type.
    #[arg(long, value_enum)]
    pub kind: ShareArg,

    /// Share value.
    #[arg(long)]
    pub value: u32,
}

/// Issues a raw call and prints the status triple. Succeeds on rc 0.
pub fn call(client: &Client, args: &CallArgs) -> Result<bool> {
    let text = args.command_text.as_deref().unwrap_or_default();
    let result = client.call(&args.target, &args.api, text);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(result.return_code == 0)
}

/// Applies a NIC definition or deletion.
pub fn nicdef(client: &Client, catalog: &ErrorCatalog, args: &NicdefArgs) -> Result<bool> {
    apply(client, catalog, &args.target, &nicdef_op(args))
}

/// Applies a share setting.
pub fn setshare(client: &Client, catalog: &ErrorCatalog, args: &SetshareArgs) -> Result<bool> {
    apply(client, catalog, &args.target, &setshare_op(args))
}

/// Check-mode report for `command`, or `None` if it never calls SMAPI.
pub fn check_report(command: &Command) -> Option<Report> {
    let planned = match command {
        Command::Call(args) => PlannedCall::new(
            args.api.as_str(),
            args.target.as_str(),
            args.command_text.as_deref().unwrap_or_default(),
        ),
        Command::Nicdef(args) => PlannedCall::of(&args.target, &nicdef_op(args)),
        Command::Setshare(args) => PlannedCall::of(&args.target, &setshare_op(args)),
        Command::Completion { .. } => return None,
    };
    Some(Report::check(planned))
}

/// Runs `op`, prints its report and returns whether it succeeded.
fn apply(
    client: &Client,
    catalog: &ErrorCatalog,
    target: &str,
    op: &impl Operation,
) -> Result<bool> {
    let outcome = client.apply(target, op, catalog);
    println!("{}", serde_json::to_string_pretty(&outcome.report())?);
    Ok(outcome.is_ok())
}

fn nicdef_op(args: &NicdefArgs) -> NicDef {
    if args.absent {
        return NicDef::delete(&args.devno);
    }
    let nic_type = match args.nic_type {
        NicTypeArg::Qdio => NicType::Qdio,
        NicTypeArg::Hiper => NicType::Hiper,
    };
    let mut op = NicDef::define(&args.devno, nic_type);
    if let Some(lan) = &args.lan {
        op = op.lan(args.lan_owner.clone(), lan);
    }
    if let Some(vlan) = &args.vlan {
        op = op.vlan(vlan);
    }
    if let Some(mac) = &args.mac_id {
        op = op.mac_id(mac);
    }
    op
}

fn setshare_op(args: &SetshareArgs) -> SetShare {
    let kind = match args.kind {
        ShareArg::Rel => ShareKind::Relative,
        ShareArg::Abs => ShareKind::Absolute,
    };
    SetShare::new(kind, args.value)
}

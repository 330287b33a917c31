// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! CLI subcommands.

mod inspect;
mod replay;
mod run;

pub use inspect::InspectCmd;
pub use replay::ReplayCmd;
pub use run::RunCmd;

#![cfg_attr(not(test), no_std)]
//! Two-party token swap escrow.
//!
//! A maker locks Token A in a vault owned by an escrow PDA and names the
//! amount of Token B it wants back. A taker settles both legs in one
//! instruction, or the maker cancels and gets the deposit back. Closing the
//! escrow account is what resolves it: whichever of take/refund lands first
//! closes it, and the other then finds nothing to act on.

use pinocchio::{
    account_info::AccountInfo, log::sol_log, program_error::ProgramError, pubkey::Pubkey,
    ProgramResult,
};

#[cfg(not(feature = "no-entrypoint"))]
mod entrypoint {
    use pinocchio::{
        account_info::AccountInfo, no_allocator, nostd_panic_handler, program_entrypoint,
        pubkey::Pubkey, ProgramResult,
    };

    program_entrypoint!(process_instruction);
    no_allocator!();
    nostd_panic_handler!();

    pub fn process_instruction(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        crate::process_instruction(program_id, accounts, instruction_data)
    }
}

pub mod error;
pub mod helpers;
pub mod instructions;
pub mod state;

pub use instructions::*;

/// Program ID
pub const ID: Pubkey = [
    0xd8, 0x54, 0xa5, 0x95, 0xb6, 0xb0, 0x97, 0x64,
    0x02, 0x95, 0x6d, 0x54, 0x14, 0x20, 0x2e, 0x10,
    0xa7, 0xdb, 0x14, 0x8f, 0x60, 0xc3, 0x78, 0xd9,
    0x5c, 0x3b, 0xa0, 0x77, 0x71, 0x87, 0xf2, 0xd6,
];

/// Escrow PDA seed prefix
pub const ESCROW_SEED: &[u8] = b"escrow";

/// Process program instruction
///
/// Instruction discriminators:
/// - 0: Make - Create an escrow offer
/// - 1: Take - Accept an escrow offer
/// - 2: Refund - Cancel an escrow offer
pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    if program_id != &ID {
        return Err(ProgramError::IncorrectProgramId);
    }

    match instruction_data.split_first() {
        Some((Make::DISCRIMINATOR, data)) => {
            sol_log("Instruction: Make");
            Make::try_from((data, accounts))?.process()
        }
        Some((Take::DISCRIMINATOR, _)) => {
            sol_log("Instruction: Take");
            Take::try_from(accounts)?.process()
        }
        Some((Refund::DISCRIMINATOR, _)) => {
            sol_log("Instruction: Refund");
            Refund::try_from(accounts)?.process()
        }
        _ => Err(ProgramError::InvalidInstructionData),
    }
}

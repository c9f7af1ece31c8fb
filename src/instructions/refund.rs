use pinocchio::{
    account_info::AccountInfo, instruction::Signer, program_error::ProgramError, seeds,
    ProgramResult,
};
use pinocchio_token_2022::instructions::{CloseAccount, TransferChecked};

use crate::{
    error::EscrowError,
    helpers::{
        AssociatedTokenAccount, MintInterface, ProgramAccount, ProgramInterface, SignerAccount,
        TokenAccountInterface, TokenProgramInterface,
    },
    state::Escrow,
    ESCROW_SEED,
};

/// Refund accounts structure
pub struct RefundAccounts<'a> {
    pub maker: &'a AccountInfo,
    pub escrow: &'a AccountInfo,
    pub mint_a: &'a AccountInfo,
    pub vault: &'a AccountInfo,
    pub maker_ata_a: &'a AccountInfo,
    pub system_program: &'a AccountInfo,
    pub token_program: &'a AccountInfo,
    pub associated_token_program: &'a AccountInfo,
}

impl<'a> TryFrom<&'a [AccountInfo]> for RefundAccounts<'a> {
    type Error = ProgramError;

    fn try_from(accounts: &'a [AccountInfo]) -> Result<Self, Self::Error> {
        let [maker, escrow, mint_a, vault, maker_ata_a, system_program, token_program, associated_token_program, _remaining @ ..] =
            accounts
        else {
            return Err(ProgramError::NotEnoughAccountKeys);
        };

        // Basic account checks
        SignerAccount::check(maker)?;
        ProgramInterface::check(system_program, &pinocchio_system::ID)?;
        TokenProgramInterface::check(token_program)?;
        ProgramInterface::check(
            associated_token_program,
            &pinocchio_associated_token_account::ID,
        )?;
        MintInterface::check(mint_a, token_program.key())?;

        Ok(Self {
            maker,
            escrow,
            mint_a,
            vault,
            maker_ata_a,
            system_program,
            token_program,
            associated_token_program,
        })
    }
}

/// Refund instruction - cancels an escrow offer
pub struct Refund<'a> {
    pub accounts: RefundAccounts<'a>,
}

impl<'a> TryFrom<&'a [AccountInfo]> for Refund<'a> {
    type Error = ProgramError;

    fn try_from(accounts: &'a [AccountInfo]) -> Result<Self, Self::Error> {
        let accounts = RefundAccounts::try_from(accounts)?;
        Ok(Self { accounts })
    }
}

impl<'a> Refund<'a> {
    /// Instruction discriminator
    pub const DISCRIMINATOR: &'static u8 = &2;

    /// Process the refund instruction
    pub fn process(&mut self) -> ProgramResult {
        let token_program = self.accounts.token_program.key();
        let escrow = *Escrow::load(self.accounts.escrow)?;

        // Only the maker recorded at creation may cancel
        if escrow.maker() != self.accounts.maker.key() {
            return Err(EscrowError::Unauthorized.into());
        }

        escrow.verify_address(self.accounts.escrow.key())?;
        if self.accounts.mint_a.key() != escrow.mint_a() {
            return Err(EscrowError::InvalidAccount.into());
        }
        AssociatedTokenAccount::check(
            self.accounts.vault,
            self.accounts.escrow.key(),
            escrow.mint_a(),
            token_program,
            escrow.vault_bump(),
        )?;

        // Make sure the maker's ATA exists (created if it was closed meanwhile)
        AssociatedTokenAccount::init_if_needed(
            self.accounts.maker_ata_a,
            self.accounts.mint_a,
            self.accounts.maker,
            self.accounts.maker,
            self.accounts.system_program,
            self.accounts.token_program,
        )?;

        // Prepare signer seeds
        let seed_bytes = escrow.seed().to_le_bytes();
        let bump_bytes = escrow.bump();
        let signer_seeds = seeds!(
            ESCROW_SEED,
            escrow.maker().as_ref(),
            seed_bytes.as_ref(),
            bump_bytes.as_ref()
        );
        let signer = Signer::from(&signer_seeds);

        // Transfer from vault back to maker
        TransferChecked {
            from: self.accounts.vault,
            mint: self.accounts.mint_a,
            to: self.accounts.maker_ata_a,
            authority: self.accounts.escrow,
            amount: TokenAccountInterface::amount(self.accounts.vault, token_program)?,
            decimals: MintInterface::decimals(self.accounts.mint_a, token_program)?,
            token_program,
        }
        .invoke_signed(&[signer.clone()])?;

        // Close the vault
        CloseAccount {
            account: self.accounts.vault,
            destination: self.accounts.maker,
            authority: self.accounts.escrow,
            token_program,
        }
        .invoke_signed(&[signer])?;

        // Close the escrow
        ProgramAccount::close(self.accounts.escrow, self.accounts.maker)
    }
}

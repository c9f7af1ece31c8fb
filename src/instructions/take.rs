use pinocchio::{
    account_info::AccountInfo, instruction::Signer, program_error::ProgramError, seeds,
    ProgramResult,
};
use pinocchio_token_2022::instructions::{CloseAccount, TransferChecked};

use crate::{
    error::EscrowError,
    helpers::{
        require_funds, AssociatedTokenAccount, MintInterface, ProgramAccount, ProgramInterface,
        SignerAccount, TokenAccountInterface, TokenProgramInterface,
    },
    state::Escrow,
    ESCROW_SEED,
};

/// Take accounts structure
pub struct TakeAccounts<'a> {
    pub taker: &'a AccountInfo,
    pub maker: &'a AccountInfo,
    pub escrow: &'a AccountInfo,
    pub mint_a: &'a AccountInfo,
    pub mint_b: &'a AccountInfo,
    pub vault: &'a AccountInfo,
    pub taker_ata_a: &'a AccountInfo,
    pub taker_ata_b: &'a AccountInfo,
    pub maker_ata_b: &'a AccountInfo,
    pub system_program: &'a AccountInfo,
    pub token_program: &'a AccountInfo,
    pub associated_token_program: &'a AccountInfo,
}

impl<'a> TryFrom<&'a [AccountInfo]> for TakeAccounts<'a> {
    type Error = ProgramError;

    fn try_from(accounts: &'a [AccountInfo]) -> Result<Self, Self::Error> {
        let [taker, maker, escrow, mint_a, mint_b, vault, taker_ata_a, taker_ata_b, maker_ata_b, system_program, token_program, associated_token_program, _remaining @ ..] =
            accounts
        else {
            return Err(ProgramError::NotEnoughAccountKeys);
        };

        // Basic account checks
        SignerAccount::check(taker)?;
        ProgramInterface::check(system_program, &pinocchio_system::ID)?;
        TokenProgramInterface::check(token_program)?;
        ProgramInterface::check(
            associated_token_program,
            &pinocchio_associated_token_account::ID,
        )?;
        MintInterface::check(mint_a, token_program.key())?;
        MintInterface::check(mint_b, token_program.key())?;

        Ok(Self {
            taker,
            maker,
            escrow,
            mint_a,
            mint_b,
            vault,
            taker_ata_a,
            taker_ata_b,
            maker_ata_b,
            system_program,
            token_program,
            associated_token_program,
        })
    }
}

/// Take instruction - accepts an escrow offer
pub struct Take<'a> {
    pub accounts: TakeAccounts<'a>,
}

impl<'a> TryFrom<&'a [AccountInfo]> for Take<'a> {
    type Error = ProgramError;

    fn try_from(accounts: &'a [AccountInfo]) -> Result<Self, Self::Error> {
        let accounts = TakeAccounts::try_from(accounts)?;
        Ok(Self { accounts })
    }
}

impl<'a> Take<'a> {
    /// Instruction discriminator
    pub const DISCRIMINATOR: &'static u8 = &1;

    /// Process the take instruction
    pub fn process(&mut self) -> ProgramResult {
        let token_program = self.accounts.token_program.key();
        let escrow = *Escrow::load(self.accounts.escrow)?;

        // Every account the trade touches is pinned by the escrow terms
        escrow.verify_address(self.accounts.escrow.key())?;
        if self.accounts.maker.key() != escrow.maker()
            || self.accounts.mint_a.key() != escrow.mint_a()
            || self.accounts.mint_b.key() != escrow.mint_b()
        {
            return Err(EscrowError::InvalidAccount.into());
        }
        AssociatedTokenAccount::check(
            self.accounts.vault,
            self.accounts.escrow.key(),
            escrow.mint_a(),
            token_program,
            escrow.vault_bump(),
        )?;

        let balance = TokenAccountInterface::check(
            self.accounts.taker_ata_b,
            escrow.mint_b(),
            self.accounts.taker.key(),
            token_program,
        )?;
        require_funds(balance, escrow.receive())?;

        // Initialize taker's Token A account if needed
        AssociatedTokenAccount::init_if_needed(
            self.accounts.taker_ata_a,
            self.accounts.mint_a,
            self.accounts.taker,
            self.accounts.taker,
            self.accounts.system_program,
            self.accounts.token_program,
        )?;

        // Initialize maker's Token B account if needed
        AssociatedTokenAccount::init_if_needed(
            self.accounts.maker_ata_b,
            self.accounts.mint_b,
            self.accounts.taker,
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

        // Transfer from the Vault to the Taker
        TransferChecked {
            from: self.accounts.vault,
            mint: self.accounts.mint_a,
            to: self.accounts.taker_ata_a,
            authority: self.accounts.escrow,
            amount: TokenAccountInterface::amount(self.accounts.vault, token_program)?,
            decimals: MintInterface::decimals(self.accounts.mint_a, token_program)?,
            token_program,
        }
        .invoke_signed(&[signer.clone()])?;

        // Transfer from the Taker to the Maker
        TransferChecked {
            from: self.accounts.taker_ata_b,
            mint: self.accounts.mint_b,
            to: self.accounts.maker_ata_b,
            authority: self.accounts.taker,
            amount: escrow.receive(),
            decimals: MintInterface::decimals(self.accounts.mint_b, token_program)?,
            token_program,
        }
        .invoke()?;

        // Close the Vault, rent goes back to the maker who paid it
        CloseAccount {
            account: self.accounts.vault,
            destination: self.accounts.maker,
            authority: self.accounts.escrow,
            token_program,
        }
        .invoke_signed(&[signer])?;

        // Close the Escrow
        ProgramAccount::close(self.accounts.escrow, self.accounts.maker)
    }
}

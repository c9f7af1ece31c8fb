use core::mem::size_of;

use pinocchio::{
    account_info::AccountInfo, instruction::Signer, program_error::ProgramError, seeds,
    ProgramResult,
};
use pinocchio_token_2022::instructions::TransferChecked;

use crate::{
    error::EscrowError,
    helpers::{
        require_funds, AssociatedTokenAccount, MintInterface, ProgramAccount, ProgramInterface,
        SignerAccount, TokenAccountInterface, TokenProgramInterface,
    },
    state::Escrow,
    ESCROW_SEED, ID,
};

/// Make accounts structure
pub struct MakeAccounts<'a> {
    pub maker: &'a AccountInfo,
    pub escrow: &'a AccountInfo,
    pub mint_a: &'a AccountInfo,
    pub mint_b: &'a AccountInfo,
    pub maker_ata_a: &'a AccountInfo,
    pub vault: &'a AccountInfo,
    pub system_program: &'a AccountInfo,
    pub token_program: &'a AccountInfo,
    pub associated_token_program: &'a AccountInfo,
}

impl<'a> TryFrom<&'a [AccountInfo]> for MakeAccounts<'a> {
    type Error = ProgramError;

    fn try_from(accounts: &'a [AccountInfo]) -> Result<Self, Self::Error> {
        let [maker, escrow, mint_a, mint_b, maker_ata_a, vault, system_program, token_program, associated_token_program, _remaining @ ..] =
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
        MintInterface::check(mint_b, token_program.key())?;

        Ok(Self {
            maker,
            escrow,
            mint_a,
            mint_b,
            maker_ata_a,
            vault,
            system_program,
            token_program,
            associated_token_program,
        })
    }
}

/// Make instruction data
#[derive(Debug, PartialEq, Eq)]
pub struct MakeInstructionData {
    pub seed: u64,
    pub receive: u64,
    pub amount: u64,
}

impl MakeInstructionData {
    pub const LEN: usize = size_of::<u64>() * 3;
}

impl<'a> TryFrom<&'a [u8]> for MakeInstructionData {
    type Error = ProgramError;

    fn try_from(data: &'a [u8]) -> Result<Self, Self::Error> {
        if data.len() != Self::LEN {
            return Err(ProgramError::InvalidInstructionData);
        }

        let seed = read_u64(data, 0)?;
        let receive = read_u64(data, 8)?;
        let amount = read_u64(data, 16)?;

        // Instruction checks
        if amount == 0 || receive == 0 {
            return Err(EscrowError::InvalidAmount.into());
        }

        Ok(Self {
            seed,
            receive,
            amount,
        })
    }
}

#[inline(always)]
fn read_u64(data: &[u8], offset: usize) -> Result<u64, ProgramError> {
    data.get(offset..offset + 8)
        .and_then(|bytes| bytes.try_into().ok())
        .map(u64::from_le_bytes)
        .ok_or(ProgramError::InvalidInstructionData)
}

/// Make instruction - creates an escrow offer
///
/// The vault is the escrow's ATA for mint A, so anyone can create it before
/// the maker does. Such a vault is reused when empty; if someone sends it
/// tokens first, the trade id fails with `InvalidAccount` and the maker has to
/// pick another one.
pub struct Make<'a> {
    pub accounts: MakeAccounts<'a>,
    pub instruction_data: MakeInstructionData,
}

impl<'a> TryFrom<(&'a [u8], &'a [AccountInfo])> for Make<'a> {
    type Error = ProgramError;

    fn try_from((data, accounts): (&'a [u8], &'a [AccountInfo])) -> Result<Self, Self::Error> {
        let accounts = MakeAccounts::try_from(accounts)?;
        let instruction_data = MakeInstructionData::try_from(data)?;

        Ok(Self {
            accounts,
            instruction_data,
        })
    }
}

impl<'a> Make<'a> {
    /// Instruction discriminator
    pub const DISCRIMINATOR: &'static u8 = &0;

    /// Process the make instruction
    pub fn process(&mut self) -> ProgramResult {
        let maker = self.accounts.maker.key();
        let mint_a = self.accounts.mint_a.key();
        let token_program = self.accounts.token_program.key();
        let MakeInstructionData {
            seed,
            receive,
            amount,
        } = self.instruction_data;

        // The escrow must sit at its derived address and must not be live yet
        let (escrow_key, bump) = Escrow::find_address(maker, seed);
        if self.accounts.escrow.key() != &escrow_key {
            return Err(EscrowError::InvalidAccount.into());
        }
        if self.accounts.escrow.is_owned_by(&ID) {
            return Err(EscrowError::RecordAlreadyExists.into());
        }

        let (vault_key, vault_bump) =
            AssociatedTokenAccount::find_address(&escrow_key, mint_a, token_program);
        if self.accounts.vault.key() != &vault_key {
            return Err(EscrowError::InvalidAccount.into());
        }
        // A vault created ahead of time must not carry tokens the escrow never recorded
        if !self.accounts.vault.data_is_empty()
            && TokenAccountInterface::amount(self.accounts.vault, token_program)? != 0
        {
            return Err(EscrowError::InvalidAccount.into());
        }

        let balance =
            TokenAccountInterface::check(self.accounts.maker_ata_a, mint_a, maker, token_program)?;
        require_funds(balance, amount)?;

        // Create the escrow account
        let seed_bytes = seed.to_le_bytes();
        let bump_bytes = [bump];
        let signer_seeds = seeds!(
            ESCROW_SEED,
            maker.as_ref(),
            seed_bytes.as_ref(),
            bump_bytes.as_ref()
        );
        ProgramAccount::init(
            self.accounts.maker,
            self.accounts.escrow,
            Escrow::LEN,
            Signer::from(&signer_seeds),
        )?;

        {
            let mut data = self.accounts.escrow.try_borrow_mut_data()?;
            Escrow::from_bytes_mut(&mut data)?.set_inner(
                seed,
                *maker,
                *mint_a,
                *self.accounts.mint_b.key(),
                amount,
                receive,
                bump,
                vault_bump,
            );
        }

        // Initialize the vault via ATA program CPI
        AssociatedTokenAccount::init_if_needed(
            self.accounts.vault,
            self.accounts.mint_a,
            self.accounts.maker,
            self.accounts.escrow,
            self.accounts.system_program,
            self.accounts.token_program,
        )?;

        // Transfer tokens to vault
        TransferChecked {
            from: self.accounts.maker_ata_a,
            mint: self.accounts.mint_a,
            to: self.accounts.vault,
            authority: self.accounts.maker,
            amount,
            decimals: MintInterface::decimals(self.accounts.mint_a, token_program)?,
            token_program,
        }
        .invoke()?;

        Ok(())
    }
}

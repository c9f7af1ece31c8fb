use pinocchio::{
    account_info::AccountInfo,
    instruction::Signer,
    program_error::ProgramError,
    pubkey::{find_program_address, Pubkey},
    sysvars::{rent::Rent, Sysvar},
    ProgramResult,
};
use pinocchio_associated_token_account::instructions::CreateIdempotent;
use pinocchio_system::instructions::{Allocate, Assign, CreateAccount, Transfer};
use pinocchio_token::state::{Mint, TokenAccount};

use crate::{error::EscrowError, ID};

/// Signer account helper
pub struct SignerAccount;

impl SignerAccount {
    pub fn check(account: &AccountInfo) -> Result<(), ProgramError> {
        if !account.is_signer() {
            return Err(ProgramError::MissingRequiredSignature);
        }
        Ok(())
    }
}

/// Program id helper for the system, token and ATA program accounts
pub struct ProgramInterface;

impl ProgramInterface {
    pub fn check(account: &AccountInfo, program_id: &Pubkey) -> Result<(), ProgramError> {
        if account.key() != program_id {
            return Err(ProgramError::IncorrectProgramId);
        }
        Ok(())
    }
}

/// Token program helper: legacy SPL Token and Token-2022 are both accepted
pub struct TokenProgramInterface;

impl TokenProgramInterface {
    #[inline(always)]
    pub fn is_supported(program_id: &Pubkey) -> bool {
        program_id == &pinocchio_token::ID || program_id == &pinocchio_token_2022::ID
    }

    pub fn check(account: &AccountInfo) -> Result<(), ProgramError> {
        if !Self::is_supported(account.key()) {
            return Err(ProgramError::IncorrectProgramId);
        }
        Ok(())
    }
}

// Token-2022 keeps the legacy base layout at the front and appends an
// account-type byte at `TokenAccount::LEN` when extensions follow.
const ACCOUNT_TYPE_MINT: u8 = 1;
const ACCOUNT_TYPE_ACCOUNT: u8 = 2;

#[inline(always)]
fn has_base_layout(data: &[u8], base_len: usize, account_type: u8) -> bool {
    data.len() == base_len
        || (data.len() > TokenAccount::LEN && data[TokenAccount::LEN] == account_type)
}

/// Mint interface helper
pub struct MintInterface;

impl MintInterface {
    pub fn check(account: &AccountInfo, token_program: &Pubkey) -> Result<(), ProgramError> {
        if !account.is_owned_by(token_program) {
            return Err(ProgramError::InvalidAccountOwner);
        }
        Ok(())
    }

    /// Read the mint decimals for `TransferChecked`.
    pub fn decimals(account: &AccountInfo, token_program: &Pubkey) -> Result<u8, ProgramError> {
        Self::check(account, token_program)?;
        let data = account.try_borrow_data()?;
        if !has_base_layout(&data, Mint::LEN, ACCOUNT_TYPE_MINT) {
            return Err(ProgramError::InvalidAccountData);
        }
        // Safety: the base mint layout was checked above.
        Ok(unsafe { Mint::from_bytes_unchecked(&data) }.decimals())
    }
}

/// Token account helper for user-held balances and the vault
pub struct TokenAccountInterface;

impl TokenAccountInterface {
    fn read<T>(
        account: &AccountInfo,
        token_program: &Pubkey,
        f: impl FnOnce(&TokenAccount) -> T,
    ) -> Result<T, ProgramError> {
        if !account.is_owned_by(token_program) {
            return Err(ProgramError::InvalidAccountOwner);
        }
        let data = account.try_borrow_data()?;
        if !has_base_layout(&data, TokenAccount::LEN, ACCOUNT_TYPE_ACCOUNT) {
            return Err(ProgramError::InvalidAccountData);
        }
        // Safety: the base token account layout was checked above.
        Ok(f(unsafe { TokenAccount::from_bytes_unchecked(&data) }))
    }

    /// Check that `account` holds `mint` for `owner` and return its balance.
    pub fn check(
        account: &AccountInfo,
        mint: &Pubkey,
        owner: &Pubkey,
        token_program: &Pubkey,
    ) -> Result<u64, ProgramError> {
        let (matches, amount) = Self::read(account, token_program, |token_account| {
            (
                token_account.mint() == mint && token_account.owner() == owner,
                token_account.amount(),
            )
        })
        .map_err(|_| ProgramError::from(EscrowError::InvalidAccount))?;
        if !matches {
            return Err(EscrowError::InvalidAccount.into());
        }
        Ok(amount)
    }

    /// Current balance of a token account.
    pub fn amount(account: &AccountInfo, token_program: &Pubkey) -> Result<u64, ProgramError> {
        Self::read(account, token_program, |token_account| token_account.amount())
    }
}

/// Recompute a PDA from a known bump (no curve check).
///
/// On chain this goes through the sha256 syscall; elsewhere the same hash is
/// computed in software.
#[inline(always)]
pub fn derive_pda<const N: usize>(seeds: &[&[u8]; N], bump: u8, program_id: &Pubkey) -> Pubkey {
    #[cfg(target_os = "solana")]
    {
        pinocchio_pubkey::derive_address(seeds, Some(bump), program_id)
    }
    #[cfg(not(target_os = "solana"))]
    {
        pinocchio_pubkey::derive_address_const(seeds, Some(bump), program_id)
    }
}

/// Fail with `InsufficientFunds` unless `available` covers `required`.
#[inline(always)]
pub fn require_funds(available: u64, required: u64) -> Result<(), EscrowError> {
    if available < required {
        return Err(EscrowError::InsufficientFunds);
    }
    Ok(())
}

/// Program account helper for PDAs
pub struct ProgramAccount;

impl ProgramAccount {
    /// Create a program-owned PDA of `space` bytes, paid by `payer`.
    ///
    /// An address that already holds lamports (anyone can send lamports to a
    /// PDA) is topped up, allocated and assigned instead, since
    /// `CreateAccount` refuses funded accounts.
    pub fn init(
        payer: &AccountInfo,
        account: &AccountInfo,
        space: usize,
        signer: Signer,
    ) -> ProgramResult {
        let required = Rent::get()?.minimum_balance(space);
        let current = account.lamports();

        if current == 0 {
            return CreateAccount {
                from: payer,
                to: account,
                lamports: required,
                space: space as u64,
                owner: &ID,
            }
            .invoke_signed(&[signer]);
        }

        if current < required {
            Transfer {
                from: payer,
                to: account,
                lamports: required - current,
            }
            .invoke()?;
        }

        Allocate {
            account,
            space: space as u64,
        }
        .invoke_signed(&[signer.clone()])?;

        Assign {
            account,
            owner: &ID,
        }
        .invoke_signed(&[signer])
    }

    /// Close a PDA account and transfer lamports to destination
    pub fn close(account: &AccountInfo, destination: &AccountInfo) -> ProgramResult {
        let lamports = account.lamports();
        let balance = destination
            .lamports()
            .checked_add(lamports)
            .ok_or(ProgramError::ArithmeticOverflow)?;

        *destination.try_borrow_mut_lamports()? = balance;
        *account.try_borrow_mut_lamports()? = 0;

        account.try_borrow_mut_data()?.fill(0);

        // Safety: the data borrow above has been released and the account is
        // now empty.
        unsafe {
            account.assign(&pinocchio_system::ID);
        }

        Ok(())
    }
}

/// Associated Token Account helper
pub struct AssociatedTokenAccount;

impl AssociatedTokenAccount {
    /// Find the ATA address and its canonical bump.
    #[inline(always)]
    pub fn find_address(wallet: &Pubkey, mint: &Pubkey, token_program: &Pubkey) -> (Pubkey, u8) {
        find_program_address(
            &[wallet.as_ref(), token_program.as_ref(), mint.as_ref()],
            &pinocchio_associated_token_account::ID,
        )
    }

    /// Recompute an ATA address from a known bump.
    #[inline(always)]
    pub fn derive_address(
        wallet: &Pubkey,
        mint: &Pubkey,
        token_program: &Pubkey,
        bump: u8,
    ) -> Pubkey {
        derive_pda(
            &[wallet.as_ref(), token_program.as_ref(), mint.as_ref()],
            bump,
            &pinocchio_associated_token_account::ID,
        )
    }

    /// Check that `ata` is the token account of `wallet` for `mint`.
    pub fn check(
        ata: &AccountInfo,
        wallet: &Pubkey,
        mint: &Pubkey,
        token_program: &Pubkey,
        bump: u8,
    ) -> ProgramResult {
        if ata.key() != &Self::derive_address(wallet, mint, token_program, bump) {
            return Err(EscrowError::InvalidAccount.into());
        }
        Ok(())
    }

    /// Create the ATA if it does not exist yet.
    pub fn init_if_needed<'a>(
        ata: &'a AccountInfo,
        mint: &'a AccountInfo,
        payer: &'a AccountInfo,
        owner: &'a AccountInfo,
        system_program: &'a AccountInfo,
        token_program: &'a AccountInfo,
    ) -> ProgramResult {
        CreateIdempotent {
            funding_account: payer,
            account: ata,
            wallet: owner,
            mint,
            system_program,
            token_program,
        }
        .invoke()
    }
}

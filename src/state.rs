use core::mem::size_of;

use pinocchio::{
    account_info::{AccountInfo, Ref},
    program_error::ProgramError,
    pubkey::{find_program_address, Pubkey},
};

use crate::{error::EscrowError, helpers::derive_pda, ESCROW_SEED, ID};

/// Escrow account state - stores all terms of one trade
///
/// Every field is a byte array so the struct has an alignment of 1 and can be
/// read in place from account data.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Escrow {
    discriminator: u8,
    /// Maker-chosen identifier, unique per maker
    seed: [u8; 8],
    maker: Pubkey,
    /// Deposited token's mint (Token A)
    mint_a: Pubkey,
    /// Requested token's mint (Token B)
    mint_b: Pubkey,
    /// Amount of Token A locked in the vault
    deposit: [u8; 8],
    /// Amount of Token B the maker wants
    receive: [u8; 8],
    bump: [u8; 1],
    vault_bump: [u8; 1],
}

const _: () = assert!(Escrow::LEN == 123);

impl Escrow {
    pub const LEN: usize = size_of::<Escrow>();

    pub const DISCRIMINATOR: u8 = 1;

    // ==================== Derivation ====================

    /// Find the escrow PDA and its canonical bump.
    #[inline(always)]
    pub fn find_address(maker: &Pubkey, seed: u64) -> (Pubkey, u8) {
        find_program_address(&[ESCROW_SEED, maker.as_ref(), &seed.to_le_bytes()], &ID)
    }

    /// Recompute the escrow PDA from a known bump (no curve check).
    #[inline(always)]
    pub fn derive_address(maker: &Pubkey, seed: u64, bump: u8) -> Pubkey {
        derive_pda(
            &[ESCROW_SEED, maker.as_ref(), &seed.to_le_bytes()],
            bump,
            &ID,
        )
    }

    /// Check that `key` is the address this record was created at.
    #[inline(always)]
    pub fn verify_address(&self, key: &Pubkey) -> Result<(), ProgramError> {
        if &Self::derive_address(&self.maker, self.seed(), self.bump[0]) != key {
            return Err(EscrowError::InvalidAccount.into());
        }
        Ok(())
    }

    // ==================== Read Helpers ====================

    /// Load a live escrow from a program-owned account.
    ///
    /// Anything that is not a live escrow (closed, never created, foreign
    /// owner, wrong size) is reported as `NotFound`.
    #[inline(always)]
    pub fn load(account: &AccountInfo) -> Result<Ref<Self>, ProgramError> {
        if !account.is_owned_by(&ID) || account.data_len() != Self::LEN {
            return Err(EscrowError::NotFound.into());
        }
        let data = account.try_borrow_data()?;
        if data[0] != Self::DISCRIMINATOR {
            return Err(EscrowError::NotFound.into());
        }
        Ok(Ref::map(data, |data| unsafe { Self::from_bytes_unchecked(data) }))
    }

    /// Read an escrow from raw account data.
    #[inline(always)]
    pub fn from_bytes(bytes: &[u8]) -> Result<&Self, ProgramError> {
        if bytes.len() != Self::LEN {
            return Err(ProgramError::InvalidAccountData);
        }
        if bytes[0] != Self::DISCRIMINATOR {
            return Err(ProgramError::UninitializedAccount);
        }
        Ok(unsafe { Self::from_bytes_unchecked(bytes) })
    }

    /// Return an `Escrow` from the given bytes.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `bytes` is at least `Escrow::LEN` long.
    /// `Escrow` has an alignment of 1 byte.
    #[inline(always)]
    pub unsafe fn from_bytes_unchecked(bytes: &[u8]) -> &Self {
        &*(bytes.as_ptr() as *const Escrow)
    }

    /// Return a mutable `Escrow` from the given bytes.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `bytes` is at least `Escrow::LEN` long.
    #[inline(always)]
    pub unsafe fn from_bytes_unchecked_mut(bytes: &mut [u8]) -> &mut Self {
        &mut *(bytes.as_mut_ptr() as *mut Escrow)
    }

    #[inline(always)]
    pub fn seed(&self) -> u64 {
        u64::from_le_bytes(self.seed)
    }

    #[inline(always)]
    pub fn maker(&self) -> &Pubkey {
        &self.maker
    }

    #[inline(always)]
    pub fn mint_a(&self) -> &Pubkey {
        &self.mint_a
    }

    #[inline(always)]
    pub fn mint_b(&self) -> &Pubkey {
        &self.mint_b
    }

    #[inline(always)]
    pub fn deposit(&self) -> u64 {
        u64::from_le_bytes(self.deposit)
    }

    #[inline(always)]
    pub fn receive(&self) -> u64 {
        u64::from_le_bytes(self.receive)
    }

    #[inline(always)]
    pub fn bump(&self) -> [u8; 1] {
        self.bump
    }

    #[inline(always)]
    pub fn vault_bump(&self) -> u8 {
        self.vault_bump[0]
    }

    // ==================== Write Helpers ====================

    /// Load a mutable escrow from a freshly created account.
    #[inline(always)]
    pub fn from_bytes_mut(bytes: &mut [u8]) -> Result<&mut Self, ProgramError> {
        if bytes.len() != Self::LEN {
            return Err(ProgramError::InvalidAccountData);
        }
        Ok(unsafe { Self::from_bytes_unchecked_mut(bytes) })
    }

    /// Initialize escrow with all fields
    #[allow(clippy::too_many_arguments)]
    #[inline(always)]
    pub fn set_inner(
        &mut self,
        seed: u64,
        maker: Pubkey,
        mint_a: Pubkey,
        mint_b: Pubkey,
        deposit: u64,
        receive: u64,
        bump: u8,
        vault_bump: u8,
    ) {
        self.discriminator = Self::DISCRIMINATOR;
        self.seed = seed.to_le_bytes();
        self.maker = maker;
        self.mint_a = mint_a;
        self.mint_b = mint_b;
        self.deposit = deposit.to_le_bytes();
        self.receive = receive.to_le_bytes();
        self.bump = [bump];
        self.vault_bump = [vault_bump];
    }
}

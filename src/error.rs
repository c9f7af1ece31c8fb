use pinocchio::program_error::ProgramError;
use thiserror::Error;

/// Escrow failures surfaced to clients as `ProgramError::Custom(code)`
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u32)]
pub enum EscrowError {
    /// Deposit or requested amount is zero
    #[error("Amount must be greater than zero")]
    InvalidAmount = 0,
    /// Signer holds less than the amount the instruction moves
    #[error("Insufficient funds")]
    InsufficientFunds = 1,
    /// A live escrow already exists for this maker and seed
    #[error("Escrow already exists")]
    RecordAlreadyExists = 2,
    /// No live escrow at the given address (never created or already resolved)
    #[error("Escrow not found")]
    NotFound = 3,
    /// Supplied account does not match its derivation or the escrow terms
    #[error("Account does not match the escrow")]
    InvalidAccount = 4,
    /// Signer is not the maker stored in the escrow
    #[error("Signer is not the escrow maker")]
    Unauthorized = 5,
}

impl From<EscrowError> for ProgramError {
    fn from(e: EscrowError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl TryFrom<u32> for EscrowError {
    type Error = ProgramError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(EscrowError::InvalidAmount),
            1 => Ok(EscrowError::InsufficientFunds),
            2 => Ok(EscrowError::RecordAlreadyExists),
            3 => Ok(EscrowError::NotFound),
            4 => Ok(EscrowError::InvalidAccount),
            5 => Ok(EscrowError::Unauthorized),
            _ => Err(ProgramError::InvalidArgument),
        }
    }
}

#![allow(dead_code)]

use std::path::PathBuf;

use litesvm::{types::FailedTransactionMetadata, LiteSVM};
use litesvm_token::{CreateAssociatedTokenAccount, CreateMint, MintTo};
use solana_instruction::{AccountMeta, Instruction};
use solana_keypair::Keypair;
use solana_message::Message;
use solana_native_token::LAMPORTS_PER_SOL;
use solana_pubkey::Pubkey;
use solana_signer::Signer;
use solana_transaction::Transaction;
use spl_token_2022_interface::{extension::StateWithExtensions, state::Account as TokenAccount};

pub const DECIMALS: u8 = 6;
pub const TOKEN: u64 = 1_000_000;

pub fn program_id() -> Pubkey {
    Pubkey::new_from_array(swap_escrow::ID)
}

pub fn token_program() -> Pubkey {
    Pubkey::new_from_array(pinocchio_token::ID)
}

pub fn token_2022_program() -> Pubkey {
    Pubkey::new_from_array(pinocchio_token_2022::ID)
}

pub fn associated_token_program() -> Pubkey {
    Pubkey::new_from_array(pinocchio_associated_token_account::ID)
}

pub fn system_program() -> Pubkey {
    Pubkey::new_from_array(pinocchio_system::ID)
}

/// Everything a trade needs: a VM with the program loaded, two mints of one
/// token program and funded wallets for both sides.
pub struct Env {
    pub svm: LiteSVM,
    pub token_program: Pubkey,
    pub authority: Keypair,
    pub maker: Keypair,
    pub taker: Keypair,
    pub mint_a: Pubkey,
    pub mint_b: Pubkey,
}

impl Env {
    pub fn new() -> Self {
        Self::with_token_program(token_program())
    }

    pub fn with_token_program(token_program: Pubkey) -> Self {
        let mut svm = LiteSVM::new();

        let so_path = std::env::var("SBF_OUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("target/deploy"))
            .join("swap_escrow.so");
        let program_data = std::fs::read(&so_path)
            .unwrap_or_else(|e| panic!("Failed to read {}: {e}", so_path.display()));
        svm.add_program(program_id(), &program_data)
            .expect("Failed to load swap_escrow.so");

        let authority = Keypair::new();
        let maker = Keypair::new();
        let taker = Keypair::new();
        for wallet in [&authority, &maker, &taker] {
            svm.airdrop(&wallet.pubkey(), 10 * LAMPORTS_PER_SOL)
                .expect("Failed to airdrop SOL");
        }

        let mint_a = CreateMint::new(&mut svm, &authority)
            .decimals(DECIMALS)
            .authority(&authority.pubkey())
            .token_program_id(&token_program)
            .send()
            .expect("Failed to create mint A");
        let mint_b = CreateMint::new(&mut svm, &authority)
            .decimals(DECIMALS)
            .authority(&authority.pubkey())
            .token_program_id(&token_program)
            .send()
            .expect("Failed to create mint B");

        Self {
            svm,
            token_program,
            authority,
            maker,
            taker,
            mint_a,
            mint_b,
        }
    }

    /// Creates `owner`'s ATA for `mint` and mints `amount` into it.
    pub fn fund(&mut self, owner: &Pubkey, mint: &Pubkey, amount: u64) -> Pubkey {
        let ata = CreateAssociatedTokenAccount::new(&mut self.svm, &self.authority, mint)
            .owner(owner)
            .token_program_id(&self.token_program)
            .send()
            .expect("Failed to create ATA");
        if amount > 0 {
            self.mint_to(mint, &ata, amount);
        }
        ata
    }

    pub fn mint_to(&mut self, mint: &Pubkey, token_account: &Pubkey, amount: u64) {
        MintTo::new(&mut self.svm, &self.authority, mint, token_account, amount)
            .token_program_id(&self.token_program)
            .send()
            .expect("Failed to mint tokens");
    }

    /// ATA of `wallet` for `mint` under this environment's token program.
    pub fn ata(&self, wallet: &Pubkey, mint: &Pubkey) -> Pubkey {
        ata_address(wallet, mint, &self.token_program)
    }

    /// Balance of an existing token account; panics if the account is gone.
    pub fn balance(&self, token_account: &Pubkey) -> u64 {
        let account = self
            .svm
            .get_account(token_account)
            .filter(|account| account.lamports > 0)
            .unwrap_or_else(|| panic!("token account {token_account} does not exist"));
        assert_eq!(account.owner, self.token_program, "not a token account");
        StateWithExtensions::<TokenAccount>::unpack(&account.data)
            .expect("Failed to unpack token account")
            .base
            .amount
    }

    pub fn is_closed(&self, address: &Pubkey) -> bool {
        self.svm
            .get_account(address)
            .map_or(true, |account| account.lamports == 0)
    }

    pub fn lamports(&self, address: &Pubkey) -> u64 {
        self.svm
            .get_account(address)
            .map_or(0, |account| account.lamports)
    }

    pub fn send(
        &mut self,
        instruction: Instruction,
        signer: &Keypair,
    ) -> Result<(), FailedTransactionMetadata> {
        // Identical transactions would otherwise be rejected as already processed
        self.svm.expire_blockhash();
        let message = Message::new(&[instruction], Some(&signer.pubkey()));
        let transaction = Transaction::new(&[signer], message, self.svm.latest_blockhash());
        self.svm.send_transaction(transaction).map(|_| ())
    }

    pub fn make(
        &mut self,
        maker: &Keypair,
        seed: u64,
        receive: u64,
        amount: u64,
    ) -> Result<(), FailedTransactionMetadata> {
        let instruction = make_ix(
            &maker.pubkey(),
            &self.mint_a,
            &self.mint_b,
            &self.token_program,
            seed,
            receive,
            amount,
        );
        self.send(instruction, maker)
    }

    pub fn take(&mut self, taker: &Keypair, maker: &Pubkey, seed: u64) -> Result<(), FailedTransactionMetadata> {
        let escrow = escrow_address(maker, seed);
        let vault = self.ata(&escrow, &self.mint_a);
        let instruction = take_ix(
            &taker.pubkey(),
            maker,
            &self.mint_a,
            &self.mint_b,
            &self.token_program,
            &escrow,
            &vault,
        );
        self.send(instruction, taker)
    }

    pub fn refund(&mut self, signer: &Keypair, maker: &Pubkey, seed: u64) -> Result<(), FailedTransactionMetadata> {
        let escrow = escrow_address(maker, seed);
        let vault = self.ata(&escrow, &self.mint_a);
        let instruction = refund_ix(&signer.pubkey(), &self.mint_a, &self.token_program, &escrow, &vault);
        self.send(instruction, signer)
    }
}

pub fn escrow_address(maker: &Pubkey, seed: u64) -> Pubkey {
    Pubkey::find_program_address(
        &[swap_escrow::ESCROW_SEED, maker.as_ref(), &seed.to_le_bytes()],
        &program_id(),
    )
    .0
}

pub fn ata_address(wallet: &Pubkey, mint: &Pubkey, token_program: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[wallet.as_ref(), token_program.as_ref(), mint.as_ref()],
        &associated_token_program(),
    )
    .0
}

pub fn make_ix(
    maker: &Pubkey,
    mint_a: &Pubkey,
    mint_b: &Pubkey,
    token_program: &Pubkey,
    seed: u64,
    receive: u64,
    amount: u64,
) -> Instruction {
    let escrow = escrow_address(maker, seed);
    let vault = ata_address(&escrow, mint_a, token_program);

    let mut data = vec![*swap_escrow::Make::DISCRIMINATOR];
    data.extend_from_slice(&seed.to_le_bytes());
    data.extend_from_slice(&receive.to_le_bytes());
    data.extend_from_slice(&amount.to_le_bytes());

    Instruction {
        program_id: program_id(),
        accounts: vec![
            AccountMeta::new(*maker, true),
            AccountMeta::new(escrow, false),
            AccountMeta::new_readonly(*mint_a, false),
            AccountMeta::new_readonly(*mint_b, false),
            AccountMeta::new(ata_address(maker, mint_a, token_program), false),
            AccountMeta::new(vault, false),
            AccountMeta::new_readonly(system_program(), false),
            AccountMeta::new_readonly(*token_program, false),
            AccountMeta::new_readonly(associated_token_program(), false),
        ],
        data,
    }
}

pub fn take_ix(
    taker: &Pubkey,
    maker: &Pubkey,
    mint_a: &Pubkey,
    mint_b: &Pubkey,
    token_program: &Pubkey,
    escrow: &Pubkey,
    vault: &Pubkey,
) -> Instruction {
    Instruction {
        program_id: program_id(),
        accounts: vec![
            AccountMeta::new(*taker, true),
            AccountMeta::new(*maker, false),
            AccountMeta::new(*escrow, false),
            AccountMeta::new_readonly(*mint_a, false),
            AccountMeta::new_readonly(*mint_b, false),
            AccountMeta::new(*vault, false),
            AccountMeta::new(ata_address(taker, mint_a, token_program), false),
            AccountMeta::new(ata_address(taker, mint_b, token_program), false),
            AccountMeta::new(ata_address(maker, mint_b, token_program), false),
            AccountMeta::new_readonly(system_program(), false),
            AccountMeta::new_readonly(*token_program, false),
            AccountMeta::new_readonly(associated_token_program(), false),
        ],
        data: vec![*swap_escrow::Take::DISCRIMINATOR],
    }
}

pub fn refund_ix(
    maker: &Pubkey,
    mint_a: &Pubkey,
    token_program: &Pubkey,
    escrow: &Pubkey,
    vault: &Pubkey,
) -> Instruction {
    Instruction {
        program_id: program_id(),
        accounts: vec![
            AccountMeta::new(*maker, true),
            AccountMeta::new(*escrow, false),
            AccountMeta::new_readonly(*mint_a, false),
            AccountMeta::new(*vault, false),
            AccountMeta::new(ata_address(maker, mint_a, token_program), false),
            AccountMeta::new_readonly(system_program(), false),
            AccountMeta::new_readonly(*token_program, false),
            AccountMeta::new_readonly(associated_token_program(), false),
        ],
        data: vec![*swap_escrow::Refund::DISCRIMINATOR],
    }
}

/// Asserts that a transaction failed with the given program error code.
pub fn assert_custom_error(result: Result<(), FailedTransactionMetadata>, code: swap_escrow::error::EscrowError) {
    let err = result.expect_err("transaction should fail");
    let expected = format!("Custom({})", code as u32);
    let actual = format!("{:?}", err.err);
    assert!(
        actual.contains(&expected),
        "expected {expected}, got {actual}\nlogs: {:#?}",
        err.meta.logs
    );
}

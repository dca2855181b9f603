//! `Reserve` and `ReserveV2`
//!
//! An ERC20 whose balances live in a [`ReserveEternalStorage`] it deploys
//! in its constructor. Administration is split across roles:
//!
//! | role    | may                                              |
//! |---------|--------------------------------------------------|
//! | owner   | rename, assign any role, nominate a successor     |
//! | minter  | mint and burn (burning needs the holder's approval) |
//! | pauser  | pause and unpause every transfer-like operation   |
//! | freezer | freeze, unfreeze and, after [`WIPE_DELAY`], wipe  |
//!
//! A role holder may hand its own role on; the owner may reassign any role.
//!
//! Upgrades are a handoff: the old token nominates the new one as owner and
//! the new token's owner calls `completeHandoff(old)`, which takes the
//! eternal storage and leaves the old token paused, ownerless and with no
//! minter or freezer.
//!
//! [`ReserveEternalStorage`]: crate::eternal_storage

use rsv_primitives::{Address, U256};
use rsv_sdk::abi::Token;

use crate::abi::{eternal_storage_abi, reserve_abi};
use crate::artifacts::Artifact;
use crate::events::ReserveEvent;
use crate::native::{require, Args, NativeFrame};
use crate::storage::{slot, StorageAccess};
use crate::{ContractError, ContractResult};

/// Token name at deployment
pub const NAME: &str = "Reserve";

/// Token symbol at deployment
pub const SYMBOL: &str = "RSV";

/// Token decimals
pub const DECIMALS: u8 = 18;

/// Seconds an account must stay frozen before it can be wiped (four weeks)
pub const WIPE_DELAY: u64 = 4 * 7 * 24 * 60 * 60;

const OWNER: u64 = 0;
const NOMINATED_OWNER: u64 = 1;
const MINTER: u64 = 2;
const PAUSER: u64 = 3;
const FREEZER: u64 = 4;
const PAUSED: u64 = 5;
const NAME_SLOT: u64 = 6;
const SYMBOL_SLOT: u64 = 7;
const TOTAL_SUPPLY: u64 = 8;
const TRUSTED_DATA: u64 = 9;

/// `constructor()`
pub(crate) fn construct(frame: &mut NativeFrame<'_>, _args: Args) -> ContractResult<()> {
    let deployer = frame.caller();
    frame.store_address(slot(OWNER), &deployer)?;
    frame.store_string(slot(NAME_SLOT), NAME)?;
    frame.store_string(slot(SYMBOL_SLOT), SYMBOL)?;

    let init_code = Artifact::EternalStorage.init_code(&[
        Token::Address(frame.address()),
        Token::Address(deployer),
    ])?;
    let data = frame.create(init_code)?;
    frame.store_address(slot(TRUSTED_DATA), &data)?;

    frame.emit(ReserveEvent::OwnershipTransferred {
        previous_owner: Address::ZERO,
        new_owner: deployer,
    })
}

pub(crate) fn call(frame: &mut NativeFrame<'_>, function: &str, args: Args) -> ContractResult<Vec<Token>> {
    Reserve { frame }.call(function, args)
}

struct Reserve<'a, 'h> {
    frame: &'a mut NativeFrame<'h>,
}

impl Reserve<'_, '_> {
    fn call(&mut self, function: &str, mut args: Args) -> ContractResult<Vec<Token>> {
        match function {
            // ==================== Views ====================
            "name" => Ok(vec![Token::String(self.frame.load_string(&slot(NAME_SLOT))?)]),
            "symbol" => Ok(vec![Token::String(self.frame.load_string(&slot(SYMBOL_SLOT))?)]),
            "decimals" => Ok(vec![Token::Uint(U256::from(DECIMALS))]),
            "totalSupply" => Ok(vec![Token::Uint(self.frame.load_u256(&slot(TOTAL_SUPPLY))?)]),
            "balanceOf" => {
                let holder = args.address()?;
                Ok(vec![Token::Uint(self.balance_of(holder)?)])
            }
            "allowance" => {
                let holder = args.address()?;
                let spender = args.address()?;
                Ok(vec![Token::Uint(self.allowance(holder, spender)?)])
            }
            "owner" => self.view_address(OWNER),
            "nominatedOwner" => self.view_address(NOMINATED_OWNER),
            "minter" => self.view_address(MINTER),
            "pauser" => self.view_address(PAUSER),
            "freezer" => self.view_address(FREEZER),
            "paused" => Ok(vec![Token::Bool(self.frame.load_bool(&slot(PAUSED))?)]),
            "getEternalStorageAddress" => self.view_address(TRUSTED_DATA),

            // ==================== ERC20 ====================
            "transfer" => {
                let to = args.address()?;
                let value = args.uint()?;
                let sender = self.frame.caller();
                self.not_paused()?;
                self.not_frozen(sender)?;
                self.not_frozen(to)?;
                self.move_tokens(sender, to, value)?;
                Ok(vec![Token::Bool(true)])
            }
            "approve" => {
                let spender = args.address()?;
                let value = args.uint()?;
                let holder = self.frame.caller();
                self.not_paused()?;
                self.not_frozen(holder)?;
                self.not_frozen(spender)?;
                self.set_allowance(holder, spender, value)?;
                Ok(vec![Token::Bool(true)])
            }
            "transferFrom" => {
                let from = args.address()?;
                let to = args.address()?;
                let value = args.uint()?;
                let spender = self.frame.caller();
                self.not_paused()?;
                self.not_frozen(spender)?;
                self.not_frozen(from)?;
                self.not_frozen(to)?;

                let allowance = self.allowance(from, spender)?;
                require(value <= allowance, "not enough allowance")?;
                self.move_tokens(from, to, value)?;
                self.set_allowance(from, spender, allowance - value)?;
                Ok(vec![Token::Bool(true)])
            }
            "increaseAllowance" => {
                let spender = args.address()?;
                let added = args.uint()?;
                let holder = self.frame.caller();
                self.not_paused()?;
                self.not_frozen(holder)?;
                self.not_frozen(spender)?;

                let updated = self
                    .allowance(holder, spender)?
                    .checked_add(added)
                    .ok_or_else(|| ContractError::Revert("allowance overflow".into()))?;
                self.set_allowance(holder, spender, updated)?;
                Ok(vec![Token::Bool(true)])
            }
            "decreaseAllowance" => {
                let spender = args.address()?;
                let removed = args.uint()?;
                let holder = self.frame.caller();
                self.not_paused()?;
                // A frozen spender may still lose its allowance
                self.not_frozen(holder)?;

                let updated = self
                    .allowance(holder, spender)?
                    .checked_sub(removed)
                    .ok_or_else(|| ContractError::Revert("allowance underflow".into()))?;
                self.set_allowance(holder, spender, updated)?;
                Ok(vec![Token::Bool(true)])
            }

            // ==================== Roles ====================
            "changeName" => {
                let new_name = args.string()?;
                let new_symbol = args.string()?;
                self.only(OWNER)?;
                self.frame.store_string(slot(NAME_SLOT), &new_name)?;
                self.frame.store_string(slot(SYMBOL_SLOT), &new_symbol)?;
                self.frame.emit(ReserveEvent::NameChanged { new_name, new_symbol })?;
                Ok(vec![])
            }
            "changeMinter" => {
                let new_minter = args.address()?;
                self.only_owner_or(MINTER)?;
                self.frame.store_address(slot(MINTER), &new_minter)?;
                self.frame.emit(ReserveEvent::MinterChanged { new_minter })?;
                Ok(vec![])
            }
            "changePauser" => {
                let new_pauser = args.address()?;
                self.only_owner_or(PAUSER)?;
                self.frame.store_address(slot(PAUSER), &new_pauser)?;
                self.frame.emit(ReserveEvent::PauserChanged { new_pauser })?;
                Ok(vec![])
            }
            "changeFreezer" => {
                let new_freezer = args.address()?;
                self.only_owner_or(FREEZER)?;
                self.frame.store_address(slot(FREEZER), &new_freezer)?;
                self.frame.emit(ReserveEvent::FreezerChanged { new_freezer })?;
                Ok(vec![])
            }

            // ==================== Supply ====================
            "mint" => {
                let to = args.address()?;
                let value = args.uint()?;
                self.only(MINTER)?;
                self.not_paused()?;
                require(!to.is_zero(), "can't mint to address zero")?;

                let supply = self.frame.load_u256(&slot(TOTAL_SUPPLY))?;
                let supply = supply
                    .checked_add(value)
                    .ok_or_else(|| ContractError::Revert("total supply overflow".into()))?;
                self.frame.store_u256(slot(TOTAL_SUPPLY), supply)?;
                self.storage_call("addBalance", &[Token::Address(to), Token::Uint(value)])?;
                self.frame.emit(ReserveEvent::Transfer {
                    from: Address::ZERO,
                    to,
                    value,
                })?;
                Ok(vec![])
            }
            "burnFrom" => {
                let from = args.address()?;
                let value = args.uint()?;
                self.only(MINTER)?;
                self.not_paused()?;

                let minter = self.frame.caller();
                let allowance = self.allowance(from, minter)?;
                require(value <= allowance, "not enough allowance")?;

                let supply = self.frame.load_u256(&slot(TOTAL_SUPPLY))?;
                let supply = supply
                    .checked_sub(value)
                    .ok_or_else(|| ContractError::Revert("total supply underflow".into()))?;
                self.frame.store_u256(slot(TOTAL_SUPPLY), supply)?;
                self.storage_call("subBalance", &[Token::Address(from), Token::Uint(value)])?;
                self.frame.emit(ReserveEvent::Transfer {
                    from,
                    to: Address::ZERO,
                    value,
                })?;
                self.set_allowance(from, minter, allowance - value)?;
                Ok(vec![])
            }

            // ==================== Emergency controls ====================
            "pause" => {
                self.only(PAUSER)?;
                self.frame.store_bool(slot(PAUSED), true)?;
                let account = self.frame.caller();
                self.frame.emit(ReserveEvent::Paused { account })?;
                Ok(vec![])
            }
            "unpause" => {
                self.only(PAUSER)?;
                self.frame.store_bool(slot(PAUSED), false)?;
                let account = self.frame.caller();
                self.frame.emit(ReserveEvent::Unpaused { account })?;
                Ok(vec![])
            }
            "freeze" => {
                let account = args.address()?;
                self.only(FREEZER)?;
                let now = U256::from(self.frame.block().timestamp);
                self.storage_call("setFrozenTime", &[Token::Address(account), Token::Uint(now)])?;
                let freezer = self.frame.caller();
                self.frame.emit(ReserveEvent::Frozen { freezer, account })?;
                Ok(vec![])
            }
            "unfreeze" => {
                let account = args.address()?;
                self.only(FREEZER)?;
                self.storage_call("setFrozenTime", &[Token::Address(account), Token::Uint(U256::zero())])?;
                let freezer = self.frame.caller();
                self.frame.emit(ReserveEvent::Unfrozen { freezer, account })?;
                Ok(vec![])
            }
            "wipe" => {
                let account = args.address()?;
                self.only(FREEZER)?;
                let frozen_at = self.frozen_time(account)?;
                require(!frozen_at.is_zero(), "account not frozen")?;
                let unlocks_at = frozen_at.saturating_add(U256::from(WIPE_DELAY));
                require(
                    U256::from(self.frame.block().timestamp) >= unlocks_at,
                    "wipe delay has not elapsed",
                )?;

                let balance = self.balance_of(account)?;
                let supply = self.frame.load_u256(&slot(TOTAL_SUPPLY))?;
                self.frame.store_u256(slot(TOTAL_SUPPLY), supply.saturating_sub(balance))?;
                self.storage_call("setBalance", &[Token::Address(account), Token::Uint(U256::zero())])?;

                let freezer = self.frame.caller();
                self.frame.emit(ReserveEvent::Transfer {
                    from: account,
                    to: Address::ZERO,
                    value: balance,
                })?;
                self.frame.emit(ReserveEvent::Wiped {
                    freezer,
                    wiped: account,
                })?;
                Ok(vec![])
            }

            // ==================== Ownership ====================
            "nominateNewOwner" => {
                let nominee = args.address()?;
                self.only(OWNER)?;
                self.frame.store_address(slot(NOMINATED_OWNER), &nominee)?;
                let previous_owner = self.frame.caller();
                self.frame.emit(ReserveEvent::NewOwnerNominated {
                    previous_owner,
                    nominee,
                })?;
                Ok(vec![])
            }
            "acceptOwnership" => {
                let nominee = self.frame.load_address(&slot(NOMINATED_OWNER))?;
                let caller = self.frame.caller();
                require(!nominee.is_zero() && caller == nominee, "must be nominated owner")?;

                let previous_owner = self.frame.load_address(&slot(OWNER))?;
                self.frame.store_address(slot(OWNER), &caller)?;
                self.frame.store_address(slot(NOMINATED_OWNER), &Address::ZERO)?;
                self.frame.emit(ReserveEvent::OwnershipTransferred {
                    previous_owner,
                    new_owner: caller,
                })?;
                Ok(vec![])
            }
            "renounceOwnership" => {
                self.only(OWNER)?;
                let previous_owner = self.frame.caller();
                self.frame.store_address(slot(OWNER), &Address::ZERO)?;
                self.frame.store_address(slot(NOMINATED_OWNER), &Address::ZERO)?;
                self.frame.emit(ReserveEvent::OwnershipTransferred {
                    previous_owner,
                    new_owner: Address::ZERO,
                })?;
                Ok(vec![])
            }
            "transferEternalStorage" => {
                let new_reserve_address = args.address()?;
                self.only(OWNER)?;
                require(!new_reserve_address.is_zero(), "zero address")?;
                self.storage_call("transferOwnership", &[Token::Address(new_reserve_address)])?;
                self.frame.emit(ReserveEvent::EternalStorageTransferred {
                    new_reserve_address,
                })?;
                Ok(vec![])
            }
            "completeHandoff" => {
                let previous = args.address()?;
                self.only(OWNER)?;
                self.complete_handoff(previous)?;
                Ok(vec![])
            }

            other => Err(ContractError::UnknownFunction(other.to_string())),
        }
    }

    fn view_address(&mut self, index: u64) -> ContractResult<Vec<Token>> {
        Ok(vec![Token::Address(self.frame.load_address(&slot(index))?)])
    }

    fn only(&mut self, role: u64) -> ContractResult<()> {
        let holder = self.frame.load_address(&slot(role))?;
        require(self.frame.caller() == holder, role_error(role))
    }

    fn only_owner_or(&mut self, role: u64) -> ContractResult<()> {
        let caller = self.frame.caller();
        let owner = self.frame.load_address(&slot(OWNER))?;
        let holder = self.frame.load_address(&slot(role))?;
        require(caller == owner || caller == holder, role_error(role))
    }

    fn not_paused(&mut self) -> ContractResult<()> {
        let paused = self.frame.load_bool(&slot(PAUSED))?;
        require(!paused, "contract is paused")
    }

    fn not_frozen(&mut self, account: Address) -> ContractResult<()> {
        let frozen_at = self.frozen_time(account)?;
        require(frozen_at.is_zero(), "account is frozen")
    }

    fn storage_call(&mut self, function: &str, args: &[Token]) -> ContractResult<Vec<Token>> {
        let data = self.frame.load_address(&slot(TRUSTED_DATA))?;
        let function = eternal_storage_abi().function(function)?;
        self.frame.call(data, function, args)
    }

    fn storage_uint(&mut self, function: &str, args: &[Token]) -> ContractResult<U256> {
        self.storage_call(function, args)?
            .into_iter()
            .next()
            .and_then(Token::into_uint)
            .ok_or_else(|| ContractError::Abi(format!("{} returned no uint256", function)))
    }

    fn balance_of(&mut self, holder: Address) -> ContractResult<U256> {
        self.storage_uint("balance", &[Token::Address(holder)])
    }

    fn allowance(&mut self, holder: Address, spender: Address) -> ContractResult<U256> {
        self.storage_uint("allowed", &[Token::Address(holder), Token::Address(spender)])
    }

    fn frozen_time(&mut self, account: Address) -> ContractResult<U256> {
        self.storage_uint("frozenTime", &[Token::Address(account)])
    }

    fn move_tokens(&mut self, from: Address, to: Address, value: U256) -> ContractResult<()> {
        require(!to.is_zero(), "can't transfer to address zero")?;
        self.storage_call("subBalance", &[Token::Address(from), Token::Uint(value)])?;
        self.storage_call("addBalance", &[Token::Address(to), Token::Uint(value)])?;
        self.frame.emit(ReserveEvent::Transfer { from, to, value })
    }

    fn set_allowance(&mut self, holder: Address, spender: Address, value: U256) -> ContractResult<()> {
        require(!spender.is_zero(), "spender cannot be address zero")?;
        self.storage_call(
            "setAllowed",
            &[Token::Address(holder), Token::Address(spender), Token::Uint(value)],
        )?;
        self.frame.emit(ReserveEvent::Approval {
            holder,
            spender,
            value,
        })
    }

    /// Take over from `previous`, which must have nominated this contract.
    ///
    /// Every role on `previous` ends up unreachable: the pauser is this
    /// contract, minter and freezer are zero and ownership is renounced.
    fn complete_handoff(&mut self, previous: Address) -> ContractResult<()> {
        let abi = reserve_abi();
        let this = self.frame.address();

        self.frame.call(previous, abi.function("acceptOwnership")?, &[])?;

        let supply = self
            .frame
            .call(previous, abi.function("totalSupply")?, &[])?
            .into_iter()
            .next()
            .and_then(Token::into_uint)
            .ok_or_else(|| ContractError::Abi("totalSupply returned nothing".into()))?;
        let data = self
            .frame
            .call(previous, abi.function("getEternalStorageAddress")?, &[])?
            .into_iter()
            .next()
            .and_then(Token::into_address)
            .ok_or_else(|| ContractError::Abi("getEternalStorageAddress returned nothing".into()))?;

        self.frame
            .call(previous, abi.function("transferEternalStorage")?, &[Token::Address(this)])?;
        self.frame.store_address(slot(TRUSTED_DATA), &data)?;
        self.frame.store_u256(slot(TOTAL_SUPPLY), supply)?;

        self.frame
            .call(previous, abi.function("changePauser")?, &[Token::Address(this)])?;
        self.frame
            .call(previous, abi.function("changeMinter")?, &[Token::Address(Address::ZERO)])?;
        self.frame
            .call(previous, abi.function("changeFreezer")?, &[Token::Address(Address::ZERO)])?;
        self.frame.call(previous, abi.function("pause")?, &[])?;
        self.frame.call(previous, abi.function("renounceOwnership")?, &[])?;
        Ok(())
    }
}

fn role_error(role: u64) -> &'static str {
    match role {
        OWNER => "must be owner",
        MINTER => "must be minter",
        PAUSER => "must be pauser",
        FREEZER => "must be freezer",
        _ => "unauthorized",
    }
}

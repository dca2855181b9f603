//! `ReserveEternalStorage`
//!
//! Holds balances, allowances and freeze times on behalf of whichever Reserve
//! contract owns it, so a token upgrade only moves ownership and never copies
//! balances. The escape hatch can take ownership back if the owner is lost.

use rsv_primitives::Address;
use rsv_sdk::abi::Token;

use crate::events::EternalStorageEvent;
use crate::native::{require, Args, NativeFrame};
use crate::storage::{address_slot, nested_address_slot, slot, StorageAccess};
use crate::{ContractError, ContractResult};

const OWNER: u64 = 0;
const ESCAPE_HATCH: u64 = 1;
const BALANCE: u64 = 2;
const ALLOWED: u64 = 3;
const FROZEN_TIME: u64 = 4;

/// `constructor(address owner, address escapeHatch)`
pub(crate) fn construct(frame: &mut NativeFrame<'_>, mut args: Args) -> ContractResult<()> {
    let owner = args.address()?;
    let escape_hatch = args.address()?;
    frame.store_address(slot(OWNER), &owner)?;
    frame.store_address(slot(ESCAPE_HATCH), &escape_hatch)?;
    frame.emit(EternalStorageEvent::OwnershipTransferred {
        old_owner: Address::ZERO,
        new_owner: owner,
    })
}

fn only_owner(frame: &mut NativeFrame<'_>) -> ContractResult<()> {
    let owner = frame.load_address(&slot(OWNER))?;
    require(frame.caller() == owner, "onlyOwner")
}

pub(crate) fn call(frame: &mut NativeFrame<'_>, function: &str, mut args: Args) -> ContractResult<Vec<Token>> {
    match function {
        "owner" => Ok(vec![Token::Address(frame.load_address(&slot(OWNER))?)]),
        "escapeHatch" => Ok(vec![Token::Address(frame.load_address(&slot(ESCAPE_HATCH))?)]),
        "transferOwnership" => {
            let new_owner = args.address()?;
            let owner = frame.load_address(&slot(OWNER))?;
            let escape_hatch = frame.load_address(&slot(ESCAPE_HATCH))?;
            let caller = frame.caller();
            require(caller == owner || caller == escape_hatch, "not authorized")?;

            frame.store_address(slot(OWNER), &new_owner)?;
            frame.emit(EternalStorageEvent::OwnershipTransferred {
                old_owner: owner,
                new_owner,
            })?;
            Ok(vec![])
        }
        "transferEscapeHatch" => {
            let new_escape_hatch = args.address()?;
            let escape_hatch = frame.load_address(&slot(ESCAPE_HATCH))?;
            require(frame.caller() == escape_hatch, "not authorized")?;

            frame.store_address(slot(ESCAPE_HATCH), &new_escape_hatch)?;
            frame.emit(EternalStorageEvent::EscapeHatchTransferred {
                old_escape_hatch: escape_hatch,
                new_escape_hatch,
            })?;
            Ok(vec![])
        }

        "balance" => {
            let key = address_slot(&args.address()?, &slot(BALANCE));
            Ok(vec![Token::Uint(frame.load_u256(&key)?)])
        }
        "setBalance" => {
            only_owner(frame)?;
            let key = address_slot(&args.address()?, &slot(BALANCE));
            frame.store_u256(key, args.uint()?)?;
            Ok(vec![])
        }
        "addBalance" => {
            only_owner(frame)?;
            let key = address_slot(&args.address()?, &slot(BALANCE));
            let current = frame.load_u256(&key)?;
            let updated = current
                .checked_add(args.uint()?)
                .ok_or_else(|| ContractError::Revert("balance overflow".into()))?;
            frame.store_u256(key, updated)?;
            Ok(vec![])
        }
        "subBalance" => {
            only_owner(frame)?;
            let key = address_slot(&args.address()?, &slot(BALANCE));
            let current = frame.load_u256(&key)?;
            let updated = current
                .checked_sub(args.uint()?)
                .ok_or_else(|| ContractError::Revert("insufficient balance".into()))?;
            frame.store_u256(key, updated)?;
            Ok(vec![])
        }

        "allowed" => {
            let holder = args.address()?;
            let spender = args.address()?;
            let key = nested_address_slot(&holder, &spender, &slot(ALLOWED));
            Ok(vec![Token::Uint(frame.load_u256(&key)?)])
        }
        "setAllowed" => {
            only_owner(frame)?;
            let holder = args.address()?;
            let spender = args.address()?;
            let key = nested_address_slot(&holder, &spender, &slot(ALLOWED));
            frame.store_u256(key, args.uint()?)?;
            Ok(vec![])
        }

        "frozenTime" => {
            let key = address_slot(&args.address()?, &slot(FROZEN_TIME));
            Ok(vec![Token::Uint(frame.load_u256(&key)?)])
        }
        "setFrozenTime" => {
            only_owner(frame)?;
            let key = address_slot(&args.address()?, &slot(FROZEN_TIME));
            frame.store_u256(key, args.uint()?)?;
            Ok(vec![])
        }

        other => Err(ContractError::UnknownFunction(other.to_string())),
    }
}

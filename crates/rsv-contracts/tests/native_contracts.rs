//! Reserve and ReserveEternalStorage executed natively against an in-memory host

use std::collections::HashMap;

use bytes::Bytes;
use rsv_contracts::abi::{eternal_storage_abi, reserve_abi};
use rsv_contracts::reserve::WIPE_DELAY;
use rsv_contracts::{
    construct, decode_revert_reason, execute, parse_native_code, Artifact, EternalStorageEvent, ReserveEvent,
};
use rsv_evm::{BlockEnv, CallContext, CreateOutcome, EvmError, ExecutionResult, Host};
use rsv_primitives::{Address, H256, U256};
use rsv_sdk::abi::Token;
use rsv_types::{create_address, Log};

// =============================================================================
// Test Helpers
// =============================================================================

const GAS: u64 = 8_000_000;

#[derive(Clone, Default)]
struct World {
    code: HashMap<Address, Vec<u8>>,
    storage: HashMap<(Address, H256), H256>,
    nonces: HashMap<Address, u64>,
    logs: Vec<Log>,
}

/// Minimal host: no balances, whole-call rollback on failure
struct TestHost {
    block: BlockEnv,
    world: World,
}

impl TestHost {
    fn new() -> Self {
        Self {
            block: BlockEnv {
                number: 1,
                timestamp: 1_600_000_000,
                chain_id: 1337,
                gas_limit: GAS,
            },
            world: World::default(),
        }
    }

    fn deploy(&mut self, from: Address, artifact: Artifact) -> Address {
        let init_code = artifact.init_code(&[]).unwrap();
        let outcome = self.create(from, Bytes::from(init_code), GAS);
        assert!(outcome.result.is_success(), "deploy failed: {:?}", outcome.result);
        self.world.logs.clear();
        outcome.address.unwrap()
    }

    /// Top-level transaction: returns the result and the logs it emitted
    fn send(&mut self, from: Address, to: Address, function: &str, args: &[Token]) -> (ExecutionResult, Vec<Log>) {
        let abi = if self.artifact_at(&to) == Some(Artifact::EternalStorage) {
            eternal_storage_abi()
        } else {
            reserve_abi()
        };
        let data = abi.function(function).unwrap().encode_input(args).unwrap();
        let snapshot = self.world.clone();
        let result = self.call(CallContext::new(from, to, data, GAS));
        if result.is_success() {
            let logs = std::mem::take(&mut self.world.logs);
            (result, logs)
        } else {
            self.world = snapshot;
            (result, Vec::new())
        }
    }

    fn ok(&mut self, from: Address, to: Address, function: &str, args: &[Token]) -> Vec<Log> {
        let (result, logs) = self.send(from, to, function, args);
        assert!(
            result.is_success(),
            "{} failed: {:?}",
            function,
            decode_revert_reason(&result.output)
        );
        logs
    }

    fn fails(&mut self, from: Address, to: Address, function: &str, args: &[Token]) -> String {
        let (result, logs) = self.send(from, to, function, args);
        assert!(!result.is_success(), "{} unexpectedly succeeded", function);
        assert!(logs.is_empty());
        decode_revert_reason(&result.output).unwrap_or_default()
    }

    fn view(&mut self, to: Address, function: &str, args: &[Token]) -> Token {
        let function = reserve_abi().function(function).unwrap();
        let data = function.encode_input(args).unwrap();
        let mut ctx = CallContext::new(Address::ZERO, to, data, GAS);
        ctx.is_static = true;
        let result = self.call(ctx);
        assert!(result.is_success());
        function.decode_output(&result.output).unwrap().remove(0)
    }

    fn uint(&mut self, to: Address, function: &str, args: &[Token]) -> U256 {
        self.view(to, function, args).into_uint().unwrap()
    }

    fn artifact_at(&self, address: &Address) -> Option<Artifact> {
        let code = self.world.code.get(address)?;
        parse_native_code(code)?.ok().map(|(artifact, _)| artifact)
    }
}

impl Host for TestHost {
    fn block(&self) -> BlockEnv {
        self.block
    }

    fn sload(&mut self, address: &Address, slot: &H256) -> H256 {
        self.world
            .storage
            .get(&(*address, *slot))
            .copied()
            .unwrap_or(H256::ZERO)
    }

    fn sstore(&mut self, address: &Address, slot: H256, value: H256) -> H256 {
        self.world
            .storage
            .insert((*address, slot), value)
            .unwrap_or(H256::ZERO)
    }

    fn emit_log(&mut self, log: Log) {
        self.world.logs.push(log);
    }

    fn call(&mut self, ctx: CallContext) -> ExecutionResult {
        match self.artifact_at(&ctx.address) {
            Some(artifact) => execute(self, &ctx, artifact),
            None => ExecutionResult::success(0, Vec::new()),
        }
    }

    fn create(&mut self, creator: Address, init_code: Bytes, gas: u64) -> CreateOutcome {
        let nonce = self.world.nonces.entry(creator).or_insert(0);
        let address = create_address(&creator, *nonce);
        *nonce += 1;

        let Some(Ok((artifact, args))) = parse_native_code(&init_code) else {
            return CreateOutcome {
                result: ExecutionResult::halt(gas, EvmError::InvalidOpcode(0xef)),
                address: None,
            };
        };
        let ctx = CallContext::new(creator, address, Bytes::new(), gas);
        let result = construct(self, &ctx, artifact, args);
        if result.is_success() {
            self.world.code.insert(address, artifact.runtime_code());
        }
        CreateOutcome {
            address: result.is_success().then_some(address),
            result,
        }
    }
}

fn addr(n: u64) -> Address {
    Address::from_low_u64(n)
}

fn a(address: Address) -> Token {
    Token::Address(address)
}

fn u(n: u64) -> Token {
    Token::Uint(U256::from(n))
}

fn decode(logs: &[Log]) -> Vec<ReserveEvent> {
    logs.iter().map(|log| ReserveEvent::decode(log).unwrap()).collect()
}

const OWNER: u64 = 1;
const MINTER: u64 = 2;
const PAUSER: u64 = 3;
const FREEZER: u64 = 4;
const ALICE: u64 = 10;
const BOB: u64 = 11;

/// Deployed token with every role handed out
fn setup() -> (TestHost, Address) {
    let mut host = TestHost::new();
    let token = host.deploy(addr(OWNER), Artifact::Reserve);
    host.ok(addr(OWNER), token, "changeMinter", &[a(addr(MINTER))]);
    host.ok(addr(OWNER), token, "changePauser", &[a(addr(PAUSER))]);
    host.ok(addr(OWNER), token, "changeFreezer", &[a(addr(FREEZER))]);
    (host, token)
}

fn mint(host: &mut TestHost, token: Address, to: Address, amount: u64) {
    host.ok(addr(MINTER), token, "mint", &[a(to), u(amount)]);
}

// =============================================================================
// Deployment
// =============================================================================

mod deployment {
    use super::*;

    #[test]
    fn test_constructor_state() {
        let mut host = TestHost::new();
        let token = host.deploy(addr(OWNER), Artifact::Reserve);

        assert_eq!(host.view(token, "owner", &[]), a(addr(OWNER)));
        assert_eq!(host.view(token, "name", &[]), Token::String("Reserve".into()));
        assert_eq!(host.view(token, "symbol", &[]), Token::String("RSV".into()));
        assert_eq!(host.uint(token, "decimals", &[]), U256::from(18));
        assert_eq!(host.uint(token, "totalSupply", &[]), U256::zero());
        assert_eq!(host.view(token, "paused", &[]), Token::Bool(false));
        assert_eq!(host.view(token, "minter", &[]), a(Address::ZERO));
    }

    #[test]
    fn test_eternal_storage_is_owned_by_token() {
        let mut host = TestHost::new();
        let token = host.deploy(addr(OWNER), Artifact::Reserve);
        let data = host.view(token, "getEternalStorageAddress", &[]).into_address().unwrap();

        assert_eq!(data, create_address(&token, 0));
        assert_eq!(host.artifact_at(&data), Some(Artifact::EternalStorage));

        let owner = eternal_storage_abi().function("owner").unwrap();
        let result = host.call(CallContext::new(Address::ZERO, data, owner.encode_input(&[]).unwrap(), GAS));
        assert_eq!(owner.decode_output(&result.output).unwrap(), vec![a(token)]);
    }

    #[test]
    fn test_unknown_selector_reverts() {
        let (mut host, token) = setup();
        let result = host.call(CallContext::new(addr(ALICE), token, vec![1, 2, 3, 4], GAS));
        assert!(!result.is_success());
        assert!(decode_revert_reason(&result.output).unwrap().contains("0x01020304"));
    }

    #[test]
    fn test_value_is_rejected() {
        let (mut host, token) = setup();
        let data = reserve_abi().function("pause").unwrap().encode_input(&[]).unwrap();
        let mut ctx = CallContext::new(addr(PAUSER), token, data, GAS);
        ctx.value = 1;
        let result = host.call(ctx);
        assert_eq!(decode_revert_reason(&result.output).as_deref(), Some("function is not payable"));
    }

    #[test]
    fn test_static_frame_cannot_write() {
        let (mut host, token) = setup();
        let data = reserve_abi().function("pause").unwrap().encode_input(&[]).unwrap();
        let mut ctx = CallContext::new(addr(PAUSER), token, data, GAS);
        ctx.is_static = true;
        let result = host.call(ctx);
        assert!(!result.is_success());
        assert_eq!(result.gas_used, GAS);
    }

    #[test]
    fn test_out_of_gas_halts() {
        let (mut host, token) = setup();
        let data = reserve_abi()
            .function("mint")
            .unwrap()
            .encode_input(&[a(addr(ALICE)), u(1)])
            .unwrap();
        let result = host.call(CallContext::new(addr(MINTER), token, data, 1_000));
        assert!(!result.is_success());
        assert_eq!(result.gas_used, 1_000);
    }
}

// =============================================================================
// ERC20
// =============================================================================

mod erc20 {
    use super::*;

    #[test]
    fn test_mint_emits_transfer_from_zero() {
        let (mut host, token) = setup();
        let logs = host.ok(addr(MINTER), token, "mint", &[a(addr(ALICE)), u(100)]);

        assert_eq!(
            decode(&logs),
            vec![ReserveEvent::Transfer {
                from: Address::ZERO,
                to: addr(ALICE),
                value: U256::from(100),
            }]
        );
        assert_eq!(host.uint(token, "balanceOf", &[a(addr(ALICE))]), U256::from(100));
        assert_eq!(host.uint(token, "totalSupply", &[]), U256::from(100));
    }

    #[test]
    fn test_mint_to_zero_fails() {
        let (mut host, token) = setup();
        host.fails(addr(MINTER), token, "mint", &[a(Address::ZERO), u(1)]);
    }

    #[test]
    fn test_mint_overflow_reverts_and_rolls_back() {
        let (mut host, token) = setup();
        host.ok(addr(MINTER), token, "mint", &[a(addr(ALICE)), Token::Uint(U256::MAX - 8)]);
        let reason = host.fails(addr(MINTER), token, "mint", &[a(addr(BOB)), u(10)]);

        assert_eq!(reason, "total supply overflow");
        assert_eq!(host.uint(token, "balanceOf", &[a(addr(BOB))]), U256::zero());
        assert_eq!(host.uint(token, "totalSupply", &[]), U256::MAX - 8);
    }

    #[test]
    fn test_transfer() {
        let (mut host, token) = setup();
        mint(&mut host, token, addr(ALICE), 100);
        let logs = host.ok(addr(ALICE), token, "transfer", &[a(addr(BOB)), u(40)]);

        assert_eq!(
            decode(&logs),
            vec![ReserveEvent::Transfer {
                from: addr(ALICE),
                to: addr(BOB),
                value: U256::from(40),
            }]
        );
        assert_eq!(host.uint(token, "balanceOf", &[a(addr(ALICE))]), U256::from(60));
        assert_eq!(host.uint(token, "balanceOf", &[a(addr(BOB))]), U256::from(40));
    }

    #[test]
    fn test_transfer_exceeding_balance_fails() {
        let (mut host, token) = setup();
        mint(&mut host, token, addr(ALICE), 10);
        let reason = host.fails(addr(ALICE), token, "transfer", &[a(addr(BOB)), u(11)]);

        assert_eq!(reason, "insufficient balance");
        assert_eq!(host.uint(token, "balanceOf", &[a(addr(ALICE))]), U256::from(10));
    }

    #[test]
    fn test_transfer_from_spends_allowance() {
        let (mut host, token) = setup();
        mint(&mut host, token, addr(ALICE), 100);
        host.ok(addr(ALICE), token, "approve", &[a(addr(BOB)), u(30)]);
        let logs = host.ok(addr(BOB), token, "transferFrom", &[a(addr(ALICE)), a(addr(BOB)), u(20)]);

        assert_eq!(
            decode(&logs),
            vec![
                ReserveEvent::Transfer {
                    from: addr(ALICE),
                    to: addr(BOB),
                    value: U256::from(20),
                },
                ReserveEvent::Approval {
                    holder: addr(ALICE),
                    spender: addr(BOB),
                    value: U256::from(10),
                },
            ]
        );
        assert_eq!(host.uint(token, "allowance", &[a(addr(ALICE)), a(addr(BOB))]), U256::from(10));
        host.fails(addr(BOB), token, "transferFrom", &[a(addr(ALICE)), a(addr(BOB)), u(11)]);
    }

    #[test]
    fn test_allowance_adjustments() {
        let (mut host, token) = setup();
        host.ok(addr(ALICE), token, "increaseAllowance", &[a(addr(BOB)), u(5)]);
        host.ok(addr(ALICE), token, "increaseAllowance", &[a(addr(BOB)), u(5)]);
        host.ok(addr(ALICE), token, "decreaseAllowance", &[a(addr(BOB)), u(3)]);
        assert_eq!(host.uint(token, "allowance", &[a(addr(ALICE)), a(addr(BOB))]), U256::from(7));

        host.fails(addr(ALICE), token, "decreaseAllowance", &[a(addr(BOB)), u(8)]);
        host.fails(addr(ALICE), token, "increaseAllowance", &[a(addr(BOB)), Token::Uint(U256::MAX)]);
    }

    #[test]
    fn test_burn_from_needs_allowance() {
        let (mut host, token) = setup();
        mint(&mut host, token, addr(ALICE), 100);
        host.fails(addr(MINTER), token, "burnFrom", &[a(addr(ALICE)), u(10)]);

        host.ok(addr(ALICE), token, "approve", &[a(addr(MINTER)), u(10)]);
        let logs = host.ok(addr(MINTER), token, "burnFrom", &[a(addr(ALICE)), u(10)]);
        assert_eq!(
            decode(&logs),
            vec![
                ReserveEvent::Transfer {
                    from: addr(ALICE),
                    to: Address::ZERO,
                    value: U256::from(10),
                },
                ReserveEvent::Approval {
                    holder: addr(ALICE),
                    spender: addr(MINTER),
                    value: U256::zero(),
                },
            ]
        );
        assert_eq!(host.uint(token, "totalSupply", &[]), U256::from(90));
    }
}

// =============================================================================
// Roles and emergency controls
// =============================================================================

mod controls {
    use super::*;

    #[test]
    fn test_only_roles_may_act() {
        let (mut host, token) = setup();
        assert_eq!(host.fails(addr(ALICE), token, "mint", &[a(addr(ALICE)), u(1)]), "must be minter");
        assert_eq!(host.fails(addr(ALICE), token, "pause", &[]), "must be pauser");
        assert_eq!(host.fails(addr(ALICE), token, "freeze", &[a(addr(BOB))]), "must be freezer");
        assert_eq!(host.fails(addr(ALICE), token, "changeMinter", &[a(addr(ALICE))]), "must be minter");
        host.fails(addr(ALICE), token, "changeName", &[Token::String("x".into()), Token::String("y".into())]);
    }

    #[test]
    fn test_role_holder_can_hand_role_on() {
        let (mut host, token) = setup();
        host.ok(addr(MINTER), token, "changeMinter", &[a(addr(ALICE))]);
        assert_eq!(host.view(token, "minter", &[]), a(addr(ALICE)));
        host.fails(addr(MINTER), token, "mint", &[a(addr(ALICE)), u(1)]);
    }

    #[test]
    fn test_change_name() {
        let (mut host, token) = setup();
        let logs = host.ok(
            addr(OWNER),
            token,
            "changeName",
            &[Token::String("Flamingo".into()), Token::String("MGO".into())],
        );
        assert_eq!(
            decode(&logs)[0].to_string(),
            r#"NameChanged{NewName: "Flamingo", NewSymbol: "MGO"}"#
        );
        assert_eq!(host.view(token, "name", &[]), Token::String("Flamingo".into()));
        assert_eq!(host.view(token, "symbol", &[]), Token::String("MGO".into()));
    }

    #[test]
    fn test_pause_blocks_transfers() {
        let (mut host, token) = setup();
        mint(&mut host, token, addr(ALICE), 10);
        host.ok(addr(PAUSER), token, "pause", &[]);

        assert_eq!(host.fails(addr(ALICE), token, "transfer", &[a(addr(BOB)), u(1)]), "contract is paused");
        host.fails(addr(ALICE), token, "approve", &[a(addr(BOB)), u(1)]);
        host.fails(addr(MINTER), token, "mint", &[a(addr(ALICE)), u(1)]);

        host.ok(addr(PAUSER), token, "unpause", &[]);
        host.ok(addr(ALICE), token, "transfer", &[a(addr(BOB)), u(1)]);
    }

    #[test]
    fn test_frozen_account_cannot_move_tokens() {
        let (mut host, token) = setup();
        mint(&mut host, token, addr(ALICE), 10);
        mint(&mut host, token, addr(BOB), 10);
        host.ok(addr(FREEZER), token, "freeze", &[a(addr(ALICE))]);

        host.fails(addr(ALICE), token, "transfer", &[a(addr(BOB)), u(1)]);
        host.fails(addr(BOB), token, "transfer", &[a(addr(ALICE)), u(1)]);
        host.fails(addr(BOB), token, "approve", &[a(addr(ALICE)), u(1)]);

        host.ok(addr(FREEZER), token, "unfreeze", &[a(addr(ALICE))]);
        host.ok(addr(ALICE), token, "transfer", &[a(addr(BOB)), u(1)]);
    }

    #[test]
    fn test_decrease_allowance_of_frozen_spender() {
        let (mut host, token) = setup();
        host.ok(addr(ALICE), token, "approve", &[a(addr(BOB)), u(10)]);
        host.ok(addr(FREEZER), token, "freeze", &[a(addr(BOB))]);

        host.ok(addr(ALICE), token, "decreaseAllowance", &[a(addr(BOB)), u(10)]);
        host.fails(addr(ALICE), token, "increaseAllowance", &[a(addr(BOB)), u(1)]);
    }

    #[test]
    fn test_wipe_waits_for_delay() {
        let (mut host, token) = setup();
        mint(&mut host, token, addr(ALICE), 50);
        mint(&mut host, token, addr(BOB), 25);

        host.fails(addr(FREEZER), token, "wipe", &[a(addr(ALICE))]);
        host.ok(addr(FREEZER), token, "freeze", &[a(addr(ALICE))]);
        host.fails(addr(FREEZER), token, "wipe", &[a(addr(ALICE))]);

        host.block.timestamp += WIPE_DELAY;
        let logs = host.ok(addr(FREEZER), token, "wipe", &[a(addr(ALICE))]);
        assert_eq!(
            decode(&logs),
            vec![
                ReserveEvent::Transfer {
                    from: addr(ALICE),
                    to: Address::ZERO,
                    value: U256::from(50),
                },
                ReserveEvent::Wiped {
                    freezer: addr(FREEZER),
                    wiped: addr(ALICE),
                },
            ]
        );
        assert_eq!(host.uint(token, "balanceOf", &[a(addr(ALICE))]), U256::zero());
        assert_eq!(host.uint(token, "totalSupply", &[]), U256::from(25));
    }
}

// =============================================================================
// Ownership and upgrades
// =============================================================================

mod upgrade {
    use super::*;

    #[test]
    fn test_two_step_ownership() {
        let (mut host, token) = setup();
        host.fails(addr(ALICE), token, "nominateNewOwner", &[a(addr(ALICE))]);
        host.ok(addr(OWNER), token, "nominateNewOwner", &[a(addr(ALICE))]);
        host.fails(addr(BOB), token, "acceptOwnership", &[]);

        let logs = host.ok(addr(ALICE), token, "acceptOwnership", &[]);
        assert_eq!(
            decode(&logs),
            vec![ReserveEvent::OwnershipTransferred {
                previous_owner: addr(OWNER),
                new_owner: addr(ALICE),
            }]
        );
        assert_eq!(host.view(token, "nominatedOwner", &[]), a(Address::ZERO));
    }

    #[test]
    fn test_handoff_moves_balances_and_retires_old_token() {
        let (mut host, token) = setup();
        mint(&mut host, token, addr(ALICE), 70);
        let data = host.view(token, "getEternalStorageAddress", &[]);
        let data_address = data.clone().into_address().unwrap();

        let successor = host.deploy(addr(OWNER), Artifact::ReserveV2);
        host.ok(addr(OWNER), token, "nominateNewOwner", &[a(successor)]);
        let logs = host.ok(addr(OWNER), successor, "completeHandoff", &[a(token)]);

        let storage_event = logs
            .iter()
            .filter(|log| log.address == data_address)
            .find_map(|log| EternalStorageEvent::decode(log).ok())
            .unwrap();
        assert_eq!(
            storage_event,
            EternalStorageEvent::OwnershipTransferred {
                old_owner: token,
                new_owner: successor,
            }
        );

        assert_eq!(host.view(successor, "getEternalStorageAddress", &[]), data);
        assert_eq!(host.uint(successor, "balanceOf", &[a(addr(ALICE))]), U256::from(70));
        assert_eq!(host.uint(successor, "totalSupply", &[]), U256::from(70));
        assert_eq!(host.view(token, "paused", &[]), Token::Bool(true));
        assert_eq!(host.view(token, "owner", &[]), a(Address::ZERO));
    }

    #[test]
    fn test_handoff_strips_old_role_holders() {
        let (mut host, token) = setup();
        let successor = host.deploy(addr(OWNER), Artifact::ReserveV2);
        host.ok(addr(OWNER), token, "nominateNewOwner", &[a(successor)]);
        host.ok(addr(OWNER), successor, "completeHandoff", &[a(token)]);

        assert_eq!(host.view(token, "minter", &[]), a(Address::ZERO));
        assert_eq!(host.view(token, "freezer", &[]), a(Address::ZERO));
        assert_eq!(host.view(token, "pauser", &[]), a(successor));

        assert_eq!(
            host.fails(addr(MINTER), token, "changeMinter", &[a(addr(BOB))]),
            "must be minter"
        );
        assert_eq!(
            host.fails(addr(FREEZER), token, "changeFreezer", &[a(addr(BOB))]),
            "must be freezer"
        );
        assert_eq!(host.fails(addr(FREEZER), token, "freeze", &[a(addr(ALICE))]), "must be freezer");
        let name = [Token::String("X".into()), Token::String("Y".into())];
        assert_eq!(host.fails(addr(OWNER), token, "changeName", &name), "must be owner");
        assert_eq!(
            host.fails(addr(PAUSER), token, "changePauser", &[a(addr(BOB))]),
            "must be pauser"
        );
        assert_eq!(host.view(token, "minter", &[]), a(Address::ZERO));
    }

    #[test]
    fn test_handoff_without_nomination_rolls_back() {
        let (mut host, token) = setup();
        let successor = host.deploy(addr(OWNER), Artifact::ReserveV2);

        assert_eq!(
            host.fails(addr(OWNER), successor, "completeHandoff", &[a(token)]),
            "must be nominated owner"
        );
        assert_eq!(host.view(token, "owner", &[]), a(addr(OWNER)));
    }

    #[test]
    fn test_escape_hatch_reclaims_storage() {
        let (mut host, token) = setup();
        let data = host.view(token, "getEternalStorageAddress", &[]).into_address().unwrap();

        host.fails(addr(ALICE), data, "transferOwnership", &[a(addr(ALICE))]);
        host.ok(addr(OWNER), data, "transferOwnership", &[a(addr(ALICE))]);
        host.ok(addr(ALICE), data, "setBalance", &[a(addr(BOB)), u(9)]);

        assert_eq!(host.uint(token, "balanceOf", &[a(addr(BOB))]), U256::from(9));
        host.fails(addr(MINTER), token, "mint", &[a(addr(BOB)), u(1)]);
    }
}

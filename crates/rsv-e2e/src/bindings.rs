//! Typed contract bindings
//!
//! Mutators sign with the given [`TransactOpts`], fill in nonce, gas price
//! and a gas estimate from the backend, submit, and hand back the signed
//! transaction without waiting for it to be mined. Views run a read-only
//! call and decode the return value.

use std::ops::Deref;
use std::sync::Arc;

use bytes::Bytes;
use rsv_contracts::artifacts::{time_util_abi, time_util_init_code};
use rsv_contracts::{Abi, Artifact, ContractError, EternalStorageEvent, Event, ReserveEvent};
use rsv_primitives::{Address, U256};
use rsv_sdk::abi::Token;
use rsv_sdk::types::CallRequest;
use rsv_types::{create_address, LegacyTx, Log, SignedTransaction};
use thiserror::Error;
use tracing::debug;

use crate::{Backend, HarnessError, HarnessResult, LogParser, TransactOpts};

/// How a failed pre-submission gas estimate is reported
pub const ESTIMATION_FAILURE: &str =
    "failed to estimate gas needed: gas required exceeds allowance or always failing transaction";

/// Binding errors
#[derive(Debug, Error)]
pub enum BindingError {
    /// The node refused to estimate: the call fails at any gas limit
    #[error("failed to estimate gas needed: {0}")]
    GasEstimation(String),

    /// Arguments or return data do not match the ABI
    #[error("abi error: {0}")]
    Abi(#[from] ContractError),

    /// Return value has an unexpected type
    #[error("unexpected output from {0}")]
    Output(String),

    /// Backend failure
    #[error(transparent)]
    Backend(HarnessError),
}

impl From<HarnessError> for BindingError {
    fn from(e: HarnessError) -> Self {
        match e {
            HarnessError::GasEstimation(message) => BindingError::GasEstimation(message),
            other => BindingError::Backend(other),
        }
    }
}

/// Binding result
pub type BindingResult<T> = Result<T, BindingError>;

async fn transact(
    backend: &dyn Backend,
    opts: &TransactOpts,
    to: Option<Address>,
    data: Vec<u8>,
) -> BindingResult<SignedTransaction> {
    let data = Bytes::from(data);
    let nonce = match opts.nonce {
        Some(nonce) => nonce,
        None => backend.pending_nonce(&opts.from).await?,
    };
    let gas_price = match opts.gas_price {
        Some(price) => price,
        None => backend.gas_price().await?,
    };
    let gas_limit = match opts.gas_limit {
        Some(limit) => limit,
        None => {
            let request = CallRequest {
                from: Some(opts.from),
                to,
                value: (opts.value > 0).then_some(opts.value),
                data: Some(data.clone()),
                ..Default::default()
            };
            backend.estimate_gas(&request).await?
        }
    };
    let chain_id = backend.chain_id().await?;

    let tx = LegacyTx {
        nonce,
        gas_price,
        gas_limit,
        to,
        value: opts.value,
        data,
    }
    .sign(&opts.key, Some(chain_id))
    .map_err(HarnessError::from)?;

    let hash = backend.send_transaction(&tx).await?;
    debug!(tx = %hash, from = %opts.from, ?to, nonce, gas_limit, "sent transaction");
    Ok(tx)
}

/// Address, ABI and backend of a deployed contract
#[derive(Clone)]
pub struct BoundContract {
    address: Address,
    abi: Arc<Abi>,
    backend: Arc<dyn Backend>,
}

impl BoundContract {
    /// Bind to an existing contract
    pub fn new(address: Address, abi: Arc<Abi>, backend: Arc<dyn Backend>) -> Self {
        Self { address, abi, backend }
    }

    /// Deploy `init_code` and bind to the address it will land at
    pub async fn deploy(
        opts: &TransactOpts,
        backend: Arc<dyn Backend>,
        abi: Arc<Abi>,
        init_code: Vec<u8>,
    ) -> BindingResult<(Address, SignedTransaction, Self)> {
        let tx = transact(backend.as_ref(), opts, None, init_code).await?;
        let address = create_address(&opts.from, tx.nonce());
        Ok((address, tx, Self::new(address, abi, backend)))
    }

    /// Contract address
    pub fn address(&self) -> Address {
        self.address
    }

    /// Backend the contract lives on
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Read-only call returning the decoded outputs
    pub async fn call(&self, method: &str, args: &[Token]) -> BindingResult<Vec<Token>> {
        let function = self.abi.function(method)?;
        let request = CallRequest {
            to: Some(self.address),
            data: Some(Bytes::from(function.encode_input(args)?)),
            ..Default::default()
        };
        let output = self.backend.call(&request).await?;
        Ok(function.decode_output(&output)?)
    }

    /// Sign and submit a call to `method`
    pub async fn transact(&self, opts: &TransactOpts, method: &str, args: &[Token]) -> BindingResult<SignedTransaction> {
        let data = self.abi.function(method)?.encode_input(args)?;
        transact(self.backend.as_ref(), opts, Some(self.address), data).await
    }

    async fn call_one(&self, method: &str, args: &[Token]) -> BindingResult<Token> {
        self.call(method, args)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BindingError::Output(method.to_string()))
    }

    async fn call_uint(&self, method: &str, args: &[Token]) -> BindingResult<U256> {
        self.call_one(method, args)
            .await?
            .into_uint()
            .ok_or_else(|| BindingError::Output(method.to_string()))
    }

    async fn call_address(&self, method: &str, args: &[Token]) -> BindingResult<Address> {
        self.call_one(method, args)
            .await?
            .into_address()
            .ok_or_else(|| BindingError::Output(method.to_string()))
    }

    async fn call_bool(&self, method: &str) -> BindingResult<bool> {
        self.call_one(method, &[])
            .await?
            .into_bool()
            .ok_or_else(|| BindingError::Output(method.to_string()))
    }

    async fn call_string(&self, method: &str) -> BindingResult<String> {
        self.call_one(method, &[])
            .await?
            .into_string()
            .ok_or_else(|| BindingError::Output(method.to_string()))
    }
}

// ==================== Reserve ====================

/// Handle to a `Reserve` token
#[derive(Clone)]
pub struct Reserve {
    contract: BoundContract,
}

impl Reserve {
    /// Deploy a new token; its constructor deploys the eternal storage
    pub async fn deploy(opts: &TransactOpts, backend: Arc<dyn Backend>) -> BindingResult<(Address, SignedTransaction, Self)> {
        Self::deploy_artifact(opts, backend, Artifact::Reserve).await
    }

    async fn deploy_artifact(
        opts: &TransactOpts,
        backend: Arc<dyn Backend>,
        artifact: Artifact,
    ) -> BindingResult<(Address, SignedTransaction, Self)> {
        let abi = Arc::new(artifact.abi().clone());
        let (address, tx, contract) = BoundContract::deploy(opts, backend, abi, artifact.init_code(&[])?).await?;
        Ok((address, tx, Self { contract }))
    }

    /// Bind to a deployed token
    pub fn at(address: Address, backend: Arc<dyn Backend>) -> Self {
        let abi = Arc::new(Artifact::Reserve.abi().clone());
        Self {
            contract: BoundContract::new(address, abi, backend),
        }
    }

    /// Token address
    pub fn address(&self) -> Address {
        self.contract.address()
    }

    // ---------- views ----------

    /// `name()`
    pub async fn name(&self) -> BindingResult<String> {
        self.contract.call_string("name").await
    }

    /// `symbol()`
    pub async fn symbol(&self) -> BindingResult<String> {
        self.contract.call_string("symbol").await
    }

    /// `decimals()`
    pub async fn decimals(&self) -> BindingResult<u8> {
        let decimals = self.contract.call_uint("decimals", &[]).await?;
        u8::try_from(decimals).map_err(|_| BindingError::Output("decimals".into()))
    }

    /// `totalSupply()`
    pub async fn total_supply(&self) -> BindingResult<U256> {
        self.contract.call_uint("totalSupply", &[]).await
    }

    /// `balanceOf(holder)`
    pub async fn balance_of(&self, holder: Address) -> BindingResult<U256> {
        self.contract.call_uint("balanceOf", &[Token::Address(holder)]).await
    }

    /// `allowance(holder, spender)`
    pub async fn allowance(&self, holder: Address, spender: Address) -> BindingResult<U256> {
        self.contract
            .call_uint("allowance", &[Token::Address(holder), Token::Address(spender)])
            .await
    }

    /// `owner()`
    pub async fn owner(&self) -> BindingResult<Address> {
        self.contract.call_address("owner", &[]).await
    }

    /// `nominatedOwner()`
    pub async fn nominated_owner(&self) -> BindingResult<Address> {
        self.contract.call_address("nominatedOwner", &[]).await
    }

    /// `minter()`
    pub async fn minter(&self) -> BindingResult<Address> {
        self.contract.call_address("minter", &[]).await
    }

    /// `pauser()`
    pub async fn pauser(&self) -> BindingResult<Address> {
        self.contract.call_address("pauser", &[]).await
    }

    /// `freezer()`
    pub async fn freezer(&self) -> BindingResult<Address> {
        self.contract.call_address("freezer", &[]).await
    }

    /// `paused()`
    pub async fn paused(&self) -> BindingResult<bool> {
        self.contract.call_bool("paused").await
    }

    /// `getEternalStorageAddress()`
    pub async fn get_eternal_storage_address(&self) -> BindingResult<Address> {
        self.contract.call_address("getEternalStorageAddress", &[]).await
    }

    // ---------- ERC20 ----------

    /// `transfer(to, value)`
    pub async fn transfer(&self, opts: &TransactOpts, to: Address, value: U256) -> BindingResult<SignedTransaction> {
        self.contract
            .transact(opts, "transfer", &[Token::Address(to), Token::Uint(value)])
            .await
    }

    /// `approve(spender, value)`
    pub async fn approve(&self, opts: &TransactOpts, spender: Address, value: U256) -> BindingResult<SignedTransaction> {
        self.contract
            .transact(opts, "approve", &[Token::Address(spender), Token::Uint(value)])
            .await
    }

    /// `transferFrom(from, to, value)`
    pub async fn transfer_from(
        &self,
        opts: &TransactOpts,
        from: Address,
        to: Address,
        value: U256,
    ) -> BindingResult<SignedTransaction> {
        self.contract
            .transact(
                opts,
                "transferFrom",
                &[Token::Address(from), Token::Address(to), Token::Uint(value)],
            )
            .await
    }

    /// `increaseAllowance(spender, addedValue)`
    pub async fn increase_allowance(
        &self,
        opts: &TransactOpts,
        spender: Address,
        added: U256,
    ) -> BindingResult<SignedTransaction> {
        self.contract
            .transact(opts, "increaseAllowance", &[Token::Address(spender), Token::Uint(added)])
            .await
    }

    /// `decreaseAllowance(spender, subtractedValue)`
    pub async fn decrease_allowance(
        &self,
        opts: &TransactOpts,
        spender: Address,
        subtracted: U256,
    ) -> BindingResult<SignedTransaction> {
        self.contract
            .transact(opts, "decreaseAllowance", &[Token::Address(spender), Token::Uint(subtracted)])
            .await
    }

    // ---------- roles ----------

    /// `changeName(newName, newSymbol)`
    pub async fn change_name(&self, opts: &TransactOpts, name: &str, symbol: &str) -> BindingResult<SignedTransaction> {
        self.contract
            .transact(
                opts,
                "changeName",
                &[Token::String(name.to_string()), Token::String(symbol.to_string())],
            )
            .await
    }

    /// `changeMinter(newMinter)`
    pub async fn change_minter(&self, opts: &TransactOpts, minter: Address) -> BindingResult<SignedTransaction> {
        self.contract.transact(opts, "changeMinter", &[Token::Address(minter)]).await
    }

    /// `changePauser(newPauser)`
    pub async fn change_pauser(&self, opts: &TransactOpts, pauser: Address) -> BindingResult<SignedTransaction> {
        self.contract.transact(opts, "changePauser", &[Token::Address(pauser)]).await
    }

    /// `changeFreezer(newFreezer)`
    pub async fn change_freezer(&self, opts: &TransactOpts, freezer: Address) -> BindingResult<SignedTransaction> {
        self.contract.transact(opts, "changeFreezer", &[Token::Address(freezer)]).await
    }

    // ---------- supply ----------

    /// `mint(to, value)`
    pub async fn mint(&self, opts: &TransactOpts, to: Address, value: U256) -> BindingResult<SignedTransaction> {
        self.contract
            .transact(opts, "mint", &[Token::Address(to), Token::Uint(value)])
            .await
    }

    /// `burnFrom(account, value)`
    pub async fn burn_from(&self, opts: &TransactOpts, account: Address, value: U256) -> BindingResult<SignedTransaction> {
        self.contract
            .transact(opts, "burnFrom", &[Token::Address(account), Token::Uint(value)])
            .await
    }

    // ---------- emergency controls ----------

    /// `pause()`
    pub async fn pause(&self, opts: &TransactOpts) -> BindingResult<SignedTransaction> {
        self.contract.transact(opts, "pause", &[]).await
    }

    /// `unpause()`
    pub async fn unpause(&self, opts: &TransactOpts) -> BindingResult<SignedTransaction> {
        self.contract.transact(opts, "unpause", &[]).await
    }

    /// `freeze(account)`
    pub async fn freeze(&self, opts: &TransactOpts, account: Address) -> BindingResult<SignedTransaction> {
        self.contract.transact(opts, "freeze", &[Token::Address(account)]).await
    }

    /// `unfreeze(account)`
    pub async fn unfreeze(&self, opts: &TransactOpts, account: Address) -> BindingResult<SignedTransaction> {
        self.contract.transact(opts, "unfreeze", &[Token::Address(account)]).await
    }

    /// `wipe(account)`
    pub async fn wipe(&self, opts: &TransactOpts, account: Address) -> BindingResult<SignedTransaction> {
        self.contract.transact(opts, "wipe", &[Token::Address(account)]).await
    }

    // ---------- ownership ----------

    /// `nominateNewOwner(nominee)`
    pub async fn nominate_new_owner(&self, opts: &TransactOpts, nominee: Address) -> BindingResult<SignedTransaction> {
        self.contract
            .transact(opts, "nominateNewOwner", &[Token::Address(nominee)])
            .await
    }

    /// `acceptOwnership()`
    pub async fn accept_ownership(&self, opts: &TransactOpts) -> BindingResult<SignedTransaction> {
        self.contract.transact(opts, "acceptOwnership", &[]).await
    }

    /// `renounceOwnership()`
    pub async fn renounce_ownership(&self, opts: &TransactOpts) -> BindingResult<SignedTransaction> {
        self.contract.transact(opts, "renounceOwnership", &[]).await
    }

    /// `transferEternalStorage(newReserveAddress)`
    pub async fn transfer_eternal_storage(&self, opts: &TransactOpts, to: Address) -> BindingResult<SignedTransaction> {
        self.contract
            .transact(opts, "transferEternalStorage", &[Token::Address(to)])
            .await
    }

    /// `completeHandoff(previousReserveAddress)`
    pub async fn complete_handoff(&self, opts: &TransactOpts, previous: Address) -> BindingResult<SignedTransaction> {
        self.contract
            .transact(opts, "completeHandoff", &[Token::Address(previous)])
            .await
    }
}

impl LogParser for Reserve {
    fn parse_log(&self, log: &Log) -> HarnessResult<Event> {
        Ok(ReserveEvent::decode(log)?.into())
    }
}

/// Handle to a `ReserveV2` token, the upgrade target of [`Reserve`].
///
/// Same interface; dereferences to a [`Reserve`] handle.
#[derive(Clone)]
pub struct ReserveV2 {
    inner: Reserve,
}

impl ReserveV2 {
    /// Deploy a new upgrade target with its own eternal storage
    pub async fn deploy(opts: &TransactOpts, backend: Arc<dyn Backend>) -> BindingResult<(Address, SignedTransaction, Self)> {
        let (address, tx, inner) = Reserve::deploy_artifact(opts, backend, Artifact::ReserveV2).await?;
        Ok((address, tx, Self { inner }))
    }

    /// Bind to a deployed upgrade target
    pub fn at(address: Address, backend: Arc<dyn Backend>) -> Self {
        Self {
            inner: Reserve::at(address, backend),
        }
    }
}

impl Deref for ReserveV2 {
    type Target = Reserve;

    fn deref(&self) -> &Reserve {
        &self.inner
    }
}

impl LogParser for ReserveV2 {
    fn parse_log(&self, log: &Log) -> HarnessResult<Event> {
        self.inner.parse_log(log)
    }
}

// ==================== Eternal storage ====================

/// Handle to a `ReserveEternalStorage`
#[derive(Clone)]
pub struct ReserveEternalStorage {
    contract: BoundContract,
}

impl ReserveEternalStorage {
    /// Bind to a deployed storage contract
    pub fn at(address: Address, backend: Arc<dyn Backend>) -> Self {
        let abi = Arc::new(Artifact::EternalStorage.abi().clone());
        Self {
            contract: BoundContract::new(address, abi, backend),
        }
    }

    /// Storage address
    pub fn address(&self) -> Address {
        self.contract.address()
    }

    /// `owner()`
    pub async fn owner(&self) -> BindingResult<Address> {
        self.contract.call_address("owner", &[]).await
    }

    /// `escapeHatch()`
    pub async fn escape_hatch(&self) -> BindingResult<Address> {
        self.contract.call_address("escapeHatch", &[]).await
    }

    /// `balance(holder)`
    pub async fn balance(&self, holder: Address) -> BindingResult<U256> {
        self.contract.call_uint("balance", &[Token::Address(holder)]).await
    }

    /// `allowed(holder, spender)`
    pub async fn allowed(&self, holder: Address, spender: Address) -> BindingResult<U256> {
        self.contract
            .call_uint("allowed", &[Token::Address(holder), Token::Address(spender)])
            .await
    }

    /// `frozenTime(account)`
    pub async fn frozen_time(&self, account: Address) -> BindingResult<U256> {
        self.contract.call_uint("frozenTime", &[Token::Address(account)]).await
    }

    /// `transferOwnership(newOwner)`
    pub async fn transfer_ownership(&self, opts: &TransactOpts, new_owner: Address) -> BindingResult<SignedTransaction> {
        self.contract
            .transact(opts, "transferOwnership", &[Token::Address(new_owner)])
            .await
    }

    /// `transferEscapeHatch(newEscapeHatch)`
    pub async fn transfer_escape_hatch(
        &self,
        opts: &TransactOpts,
        new_escape_hatch: Address,
    ) -> BindingResult<SignedTransaction> {
        self.contract
            .transact(opts, "transferEscapeHatch", &[Token::Address(new_escape_hatch)])
            .await
    }

    /// `setBalance(holder, value)`
    pub async fn set_balance(&self, opts: &TransactOpts, holder: Address, value: U256) -> BindingResult<SignedTransaction> {
        self.contract
            .transact(opts, "setBalance", &[Token::Address(holder), Token::Uint(value)])
            .await
    }

    pub async fn add_balance(&self, opts: &TransactOpts, holder: Address, value: U256) -> BindingResult<SignedTransaction> {
        self.contract
            .transact(opts, "addBalance", &[Token::Address(holder), Token::Uint(value)])
            .await
    }

    pub async fn sub_balance(&self, opts: &TransactOpts, holder: Address, value: U256) -> BindingResult<SignedTransaction> {
        self.contract
            .transact(opts, "subBalance", &[Token::Address(holder), Token::Uint(value)])
            .await
    }

    pub async fn set_allowed(
        &self,
        opts: &TransactOpts,
        holder: Address,
        spender: Address,
        value: U256,
    ) -> BindingResult<SignedTransaction> {
        let args = [Token::Address(holder), Token::Address(spender), Token::Uint(value)];
        self.contract.transact(opts, "setAllowed", &args).await
    }

    pub async fn set_frozen_time(&self, opts: &TransactOpts, who: Address, time: U256) -> BindingResult<SignedTransaction> {
        self.contract
            .transact(opts, "setFrozenTime", &[Token::Address(who), Token::Uint(time)])
            .await
    }
}

impl LogParser for ReserveEternalStorage {
    fn parse_log(&self, log: &Log) -> HarnessResult<Event> {
        Ok(EternalStorageEvent::decode(log)?.into())
    }
}

// ==================== Time utility ====================

/// Handle to the block-time utility contract
#[derive(Clone)]
pub struct TimeUtil {
    contract: BoundContract,
}

impl TimeUtil {
    /// Deploy the compiled utility
    pub async fn deploy(opts: &TransactOpts, backend: Arc<dyn Backend>) -> BindingResult<(Address, SignedTransaction, Self)> {
        let abi = Arc::new(time_util_abi()?);
        let (address, tx, contract) = BoundContract::deploy(opts, backend, abi, time_util_init_code()?).await?;
        Ok((address, tx, Self { contract }))
    }

    /// Utility address
    pub fn address(&self) -> Address {
        self.contract.address()
    }

    /// `time()`: timestamp of the latest block
    pub async fn time(&self) -> BindingResult<U256> {
        self.contract.call_uint("time", &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{wait_mined, HarnessConfig, SimulatedBackend, TestAccount};
    use rsv_sdk::{MockTransport, RpcClient};
    use std::time::Duration;

    fn simulated() -> (Arc<dyn Backend>, Vec<TestAccount>) {
        let accounts = TestAccount::all().unwrap();
        let backend = SimulatedBackend::funded(&HarnessConfig::default(), accounts.iter().map(|a| a.address()));
        (Arc::new(backend), accounts)
    }

    #[test]
    fn test_estimation_failure_message() {
        let err = BindingError::from(HarnessError::GasEstimation(rsv_core::GAS_ESTIMATION_FAILED.to_string()));
        assert_eq!(err.to_string(), ESTIMATION_FAILURE);
    }

    #[tokio::test]
    async fn test_deploy_address_matches_receipt() {
        let (backend, accounts) = simulated();
        let (address, tx, reserve) = Reserve::deploy(&accounts[0].signer(), backend.clone()).await.unwrap();

        let receipt = wait_mined(backend.as_ref(), &tx.hash()).await.unwrap();
        assert_eq!(receipt.contract_address, Some(address));
        assert_eq!(reserve.address(), address);
        assert_eq!(reserve.owner().await.unwrap(), accounts[0].address());
        assert_eq!(reserve.decimals().await.unwrap(), 18);
    }

    #[tokio::test]
    async fn test_v2_is_a_distinct_artifact() {
        let (backend, accounts) = simulated();
        let (_, _, token) = ReserveV2::deploy(&accounts[1].signer(), backend.clone()).await.unwrap();
        assert_eq!(token.name().await.unwrap(), "Reserve");
        assert_eq!(token.owner().await.unwrap(), accounts[1].address());
    }

    #[tokio::test]
    async fn test_mutator_fails_estimation_for_non_minter() {
        let (backend, accounts) = simulated();
        let (_, _, reserve) = Reserve::deploy(&accounts[0].signer(), backend).await.unwrap();

        let err = reserve
            .mint(&accounts[2].signer(), accounts[2].address(), U256::from(7u64))
            .await
            .unwrap_err();
        assert!(matches!(err, BindingError::GasEstimation(_)));
        assert_eq!(err.to_string(), ESTIMATION_FAILURE);
    }

    #[tokio::test]
    async fn test_explicit_gas_limit_skips_estimation() {
        let (backend, accounts) = simulated();
        let (_, _, reserve) = Reserve::deploy(&accounts[0].signer(), backend.clone()).await.unwrap();

        let opts = accounts[2].signer().with_gas_limit(200_000);
        let tx = reserve.pause(&opts).await.unwrap();
        let receipt = wait_mined(backend.as_ref(), &tx.hash()).await.unwrap();
        assert!(!receipt.is_success());
        assert!(receipt.logs.is_empty());
    }

    #[tokio::test]
    async fn test_time_util_reads_latest_block() {
        let (backend, accounts) = simulated();
        let (_, _, time_util) = TimeUtil::deploy(&accounts[0].signer(), backend).await.unwrap();
        assert_eq!(
            time_util.time().await.unwrap(),
            U256::from(rsv_core::DEFAULT_GENESIS_TIMESTAMP + rsv_core::BLOCK_INTERVAL)
        );
    }

    #[tokio::test]
    async fn test_transact_over_rpc_uses_node_values() {
        let transport = MockTransport::new();
        transport.set_response("eth_getTransactionCount", serde_json::json!("0x4"));
        transport.set_response("eth_gasPrice", serde_json::json!("0x3b9aca00"));
        transport.set_response("eth_estimateGas", serde_json::json!("0x9c40"));
        transport.set_response(
            "eth_sendRawTransaction",
            serde_json::json!(rsv_primitives::H256::ZERO.to_hex()),
        );
        let backend: Arc<dyn Backend> = Arc::new(crate::RpcBackend::with_client(
            RpcClient::with_transport(transport.clone()),
            Duration::from_millis(1),
        ));
        let account = TestAccount::all().unwrap().remove(0);

        let reserve = Reserve::at(Address::from_low_u64(0xaa), backend);
        let tx = reserve.pause(&account.signer()).await.unwrap();

        assert_eq!(tx.nonce(), 4);
        assert_eq!(tx.gas_limit(), 40_000);
        assert_eq!(tx.tx.gas_price, 1_000_000_000);
        assert_eq!(tx.recover_sender().unwrap(), account.address());
        let methods: Vec<String> = transport.requests().into_iter().map(|(m, _)| m).collect();
        assert!(methods.contains(&"eth_estimateGas".to_string()));
        assert_eq!(methods.last().map(String::as_str), Some("eth_sendRawTransaction"));
    }
}

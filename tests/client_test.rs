use erc8004::{
    models::{AgentMetadata, AgentService},
    services::uri::build_agent_uri,
    ClientOptions, Erc8004Client, Erc8004Error,
};
use ethers::abi::{encode, Token};
use ethers::types::{Address, H256, U256};
use ethers::utils::keccak256;
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;

const ANVIL_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

fn rpc_result(result: serde_json::Value) -> String {
    json!({ "jsonrpc": "2.0", "id": 1, "result": result }).to_string()
}

fn abi_hex(tokens: &[Token]) -> String {
    format!("0x{}", hex::encode(encode(tokens)))
}

async fn mock_method(server: &mut ServerGuard, method: &str, result: serde_json::Value) -> mockito::Mock {
    server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({ "method": method })))
        .with_header("content-type", "application/json")
        .with_body(rpc_result(result))
        .create_async()
        .await
}

const TX_HASH: &str = "0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060";
const BLOCK_HASH: &str = "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b";

/// Serve every call a signing client makes to send one transaction and
/// see it mined with the given receipt `status` and `logs`.
async fn mock_mined_transaction(
    server: &mut ServerGuard,
    from: Address,
    to: Address,
    status: &str,
    logs: serde_json::Value,
) -> Vec<mockito::Mock> {
    let transaction = json!({
        "hash": TX_HASH,
        "nonce": "0x0",
        "blockHash": BLOCK_HASH,
        "blockNumber": "0x10",
        "transactionIndex": "0x0",
        "from": from,
        "to": to,
        "value": "0x0",
        "gasPrice": "0x3b9aca00",
        "gas": "0x30d40",
        "input": "0x",
        "v": "0xe5",
        "r": "0x1",
        "s": "0x1"
    });
    let receipt = json!({
        "transactionHash": TX_HASH,
        "transactionIndex": "0x0",
        "blockHash": BLOCK_HASH,
        "blockNumber": "0x10",
        "from": from,
        "to": to,
        "cumulativeGasUsed": "0x1d4c0",
        "gasUsed": "0x1d4c0",
        "contractAddress": null,
        "logs": logs,
        "status": status,
        "logsBloom": format!("0x{}", "0".repeat(512)),
        "effectiveGasPrice": "0x3b9aca00"
    });

    vec![
        mock_method(server, "eth_chainId", json!("0x61")).await,
        mock_method(server, "eth_getTransactionCount", json!("0x0")).await,
        mock_method(server, "eth_gasPrice", json!("0x3b9aca00")).await,
        mock_method(server, "eth_estimateGas", json!("0x30d40")).await,
        mock_method(server, "eth_sendRawTransaction", json!(TX_HASH)).await,
        mock_method(server, "eth_getTransactionByHash", transaction).await,
        mock_method(server, "eth_getTransactionReceipt", receipt).await,
    ]
}

fn registered_log(registry: Address, agent_id: u64, owner: Address) -> serde_json::Value {
    let signature = H256::from(keccak256("Registered(uint256,string,address)"));
    let id_topic = H256::from_low_u64_be(agent_id);
    let mut owner_topic = [0u8; 32];
    owner_topic[12..].copy_from_slice(owner.as_bytes());

    json!({
        "address": registry,
        "topics": [signature, id_topic, H256::from(owner_topic)],
        "data": "0x",
        "blockHash": BLOCK_HASH,
        "blockNumber": "0x10",
        "transactionHash": TX_HASH,
        "transactionIndex": "0x0",
        "logIndex": "0x0",
        "removed": false
    })
}

fn signing_client_for(server: &ServerGuard) -> Erc8004Client {
    let options = ClientOptions::new("bsc-testnet").with_rpc_url(server.url());
    Erc8004Client::from_private_key(ANVIL_KEY, options).unwrap()
}

fn client_for(chain: &str, server: &ServerGuard) -> Erc8004Client {
    Erc8004Client::new(ClientOptions::new(chain).with_rpc_url(server.url())).unwrap()
}

#[tokio::test]
async fn probe_reports_reachable_endpoint() {
    let mut server = Server::new_async().await;
    let _mock = mock_method(&mut server, "eth_chainId", json!("0x38")).await;

    let client = client_for("bsc", &server);
    assert!(client.is_connected().await);
    client.verify_chain().await.unwrap();
}

#[tokio::test]
async fn verify_chain_detects_mismatch() {
    let mut server = Server::new_async().await;
    let _mock = mock_method(&mut server, "eth_chainId", json!("0x61")).await;

    let client = client_for("bsc", &server);
    let err = client.verify_chain().await.unwrap_err();
    assert!(matches!(
        err,
        Erc8004Error::ChainMismatch {
            expected: 56,
            actual: 97
        }
    ));
}

#[tokio::test]
async fn probe_swallows_connection_errors() {
    let options = ClientOptions::new("bsc-testnet").with_rpc_url("http://127.0.0.1:1");
    let client = Erc8004Client::new(options).unwrap();
    assert!(!client.is_connected().await);
}

#[tokio::test]
async fn probe_swallows_rpc_errors() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/")
        .with_status(500)
        .with_body("upstream unavailable")
        .create_async()
        .await;

    let client = client_for("bsc-testnet", &server);
    assert!(!client.is_connected().await);
}

#[tokio::test]
async fn reads_registry_version() {
    let mut server = Server::new_async().await;
    let result = abi_hex(&[Token::String("1.0.0".into())]);
    let _mock = mock_method(&mut server, "eth_call", json!(result)).await;

    let client = client_for("bsc-testnet", &server);
    assert_eq!(client.get_version().await.unwrap(), "1.0.0");
}

#[tokio::test]
async fn reads_agent_with_inline_metadata() {
    let mut server = Server::new_async().await;

    let metadata = AgentMetadata::new("Oracle", "Prices things")
        .with_service(AgentService::new("MCP", "https://oracle.example/mcp"));
    let agent_uri = build_agent_uri(&metadata).unwrap();
    let owner: Address = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".parse().unwrap();

    // tokenURI(uint256) and ownerOf(uint256) selectors
    let _uri = server
        .mock("POST", "/")
        .match_body(Matcher::Regex("c87b56dd".into()))
        .with_body(rpc_result(json!(abi_hex(&[Token::String(agent_uri.clone())]))))
        .create_async()
        .await;
    let _owner = server
        .mock("POST", "/")
        .match_body(Matcher::Regex("6352211e".into()))
        .with_body(rpc_result(json!(abi_hex(&[Token::Address(owner)]))))
        .create_async()
        .await;

    let client = client_for("bsc-testnet", &server);
    let agent = client.get_agent(7u64).await.unwrap();

    assert_eq!(agent.agent_id, U256::from(7));
    assert_eq!(agent.owner, owner);
    assert_eq!(agent.agent_uri, agent_uri);
    assert_eq!(agent.chain_id, 97);
    assert_eq!(agent.metadata, Some(metadata));
}

#[tokio::test]
async fn write_calls_need_a_signer() {
    let client = Erc8004Client::new(ClientOptions::default()).unwrap();
    let err = client
        .identity()
        .set_agent_uri(U256::one(), "https://agent.example/card.json")
        .await
        .unwrap_err();
    assert!(matches!(err, Erc8004Error::NoSigner));
}

#[test]
fn signer_address_matches_key() {
    let client = Erc8004Client::from_private_key(ANVIL_KEY, ClientOptions::new("base-sepolia")).unwrap();
    let expected: Address = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".parse().unwrap();
    assert_eq!(client.address(), Some(expected));
    assert_eq!(client.chain().chain_id, 84532);
}

#[tokio::test]
async fn register_returns_id_from_registered_log() {
    let mut server = Server::new_async().await;
    let client = signing_client_for(&server);
    let owner = client.address().unwrap();
    let registry = client.identity().address();

    let logs = json!([registered_log(registry, 42, owner)]);
    let _mocks = mock_mined_transaction(&mut server, owner, registry, "0x1", logs).await;

    let metadata = AgentMetadata::new("Oracle", "Prices things");
    let agent = client.register_full(&metadata, &[]).await.unwrap();
    assert_eq!(agent.agent_id, U256::from(42));
    assert_eq!(agent.owner, owner);
    assert_eq!(agent.tx_hash, Some(TX_HASH.parse::<H256>().unwrap()));
    assert_eq!(agent.metadata, Some(metadata));

    let agent_id = client
        .register("Oracle", "Prices things", Default::default())
        .await
        .unwrap();
    assert_eq!(agent_id, U256::from(42));
}

#[tokio::test]
async fn reverted_registration_is_an_error() {
    let mut server = Server::new_async().await;
    let client = signing_client_for(&server);
    let owner = client.address().unwrap();
    let registry = client.identity().address();

    let _mocks = mock_mined_transaction(&mut server, owner, registry, "0x0", json!([])).await;

    let err = client
        .register("Oracle", "Prices things", Default::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Erc8004Error::TransactionReverted(hash) if hash == TX_HASH.parse::<H256>().unwrap()));
}

#[tokio::test]
async fn mined_registration_without_event_is_an_error() {
    let mut server = Server::new_async().await;
    let client = signing_client_for(&server);
    let owner = client.address().unwrap();
    let registry = client.identity().address();

    let _mocks = mock_mined_transaction(&mut server, owner, registry, "0x1", json!([])).await;

    let err = client
        .register("Oracle", "Prices things", Default::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Erc8004Error::MissingEvent { event: "Registered", .. }));
}

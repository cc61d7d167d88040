use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use wallet_api_client::{
    InvokeError, ListCurrenciesParams, SUPPORTED_REQUEST_METHODS, Transaction, WalletApi,
    WalletApiClient, WireLog, methods,
};

#[tokio::test]
async fn list_currencies_request_round_trip() -> anyhow::Result<()> {
    let (client_stream, server_stream) = tokio::io::duplex(16 * 1024);
    let (client_read, client_write) = tokio::io::split(client_stream);
    let (server_read, mut server_write) = tokio::io::split(server_stream);

    let client = WalletApiClient::connect_with_io(Box::new(client_write), Box::new(client_read), None);

    let server = tokio::spawn(async move {
        let mut reader = BufReader::new(server_read);
        let mut request_line = String::new();
        let bytes = reader.read_line(&mut request_line).await?;
        if bytes == 0 {
            return Err(anyhow::anyhow!("missing request"));
        }

        let request: Value = serde_json::from_str(request_line.trim())?;
        assert_eq!(request["jsonrpc"], json!("2.0"));
        assert_eq!(request["method"], json!(methods::CURRENCY_LIST));
        assert!(SUPPORTED_REQUEST_METHODS.contains(&methods::CURRENCY_LIST));
        assert_eq!(request["params"], json!({ "currencyIds": ["ethereum"] }));

        let response = json!({
            "jsonrpc": "2.0",
            "id": request["id"].clone(),
            "result": [{
                "type": "CryptoCurrency",
                "id": "ethereum",
                "ticker": "ETH",
                "name": "Ethereum",
                "family": "ethereum",
                "color": "#0ebdcd",
                "decimals": 18
            }]
        });
        server_write
            .write_all(format!("{}\n", serde_json::to_string(&response)?).as_bytes())
            .await?;
        server_write.flush().await?;
        Ok::<(), anyhow::Error>(())
    });

    let currencies = client
        .list_currencies(ListCurrenciesParams {
            currency_ids: Some(vec!["ethereum".to_string()]),
        })
        .await?;
    assert_eq!(currencies.len(), 1);
    assert_eq!(currencies[0].ticker, "ETH");

    server.await??;
    Ok(())
}

#[tokio::test]
async fn remote_error_object_is_surfaced_verbatim() -> anyhow::Result<()> {
    let (client_stream, server_stream) = tokio::io::duplex(16 * 1024);
    let (client_read, client_write) = tokio::io::split(client_stream);
    let (server_read, mut server_write) = tokio::io::split(server_stream);

    let client = WalletApiClient::connect_with_io(Box::new(client_write), Box::new(client_read), None);

    let server = tokio::spawn(async move {
        let mut reader = BufReader::new(server_read);
        let mut request_line = String::new();
        reader.read_line(&mut request_line).await?;
        let request: Value = serde_json::from_str(request_line.trim())?;
        assert_eq!(request["method"], json!("transaction.sign"));
        assert_eq!(request["params"]["transaction"]["amount"], json!("15"));
        assert_eq!(request["params"]["transaction"]["data"], json!("0x0102"));

        let response = json!({
            "jsonrpc": "2.0",
            "id": request["id"].clone(),
            "error": { "code": 4001, "message": "User rejected", "data": { "step": "device" } }
        });
        server_write
            .write_all(format!("{}\n", serde_json::to_string(&response)?).as_bytes())
            .await?;
        Ok::<(), anyhow::Error>(())
    });

    let transaction = Transaction {
        family: "ethereum".to_string(),
        amount: 15,
        recipient: "0xabc".to_string(),
        data: Some(vec![1, 2]),
        extra: serde_json::Map::new(),
    };
    let result = client
        .sign_transaction("acc-1".to_string(), transaction, Default::default())
        .await;

    assert_eq!(
        result,
        Err(InvokeError::Remote {
            code: 4001,
            message: "User rejected".to_string(),
            data: Some(json!({ "step": "device" })),
        })
    );
    server.await??;
    Ok(())
}

#[tokio::test]
async fn closed_connection_fails_outstanding_requests() -> anyhow::Result<()> {
    let (client_stream, server_stream) = tokio::io::duplex(16 * 1024);
    let (client_read, client_write) = tokio::io::split(client_stream);

    let client = WalletApiClient::connect_with_io(Box::new(client_write), Box::new(client_read), None);

    let server = tokio::spawn(async move {
        let (server_read, _server_write) = tokio::io::split(server_stream);
        let mut reader = BufReader::new(server_read);
        let mut request_line = String::new();
        reader.read_line(&mut request_line).await?;
        Ok::<(), anyhow::Error>(())
    });

    let result = client.receive("acc-1".to_string()).await;
    assert_eq!(result, Err(InvokeError::Closed));
    server.await??;
    Ok(())
}

#[tokio::test]
async fn requests_after_host_output_closes_fail_immediately() -> anyhow::Result<()> {
    let (client_out, host_in) = tokio::io::duplex(16 * 1024);
    let (client_in, host_out) = tokio::io::duplex(16 * 1024);
    let client = WalletApiClient::connect_with_io(Box::new(client_out), Box::new(client_in), None);

    // The host keeps reading requests but has closed its output.
    drop(host_out);
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let result = tokio::time::timeout(
        std::time::Duration::from_millis(500),
        client.list_accounts(Default::default()),
    )
    .await?;
    assert_eq!(result, Err(InvokeError::Closed));

    let second = tokio::time::timeout(
        std::time::Duration::from_millis(500),
        client.start_exchange(wallet_api_client::ExchangeType::Fund),
    )
    .await?;
    assert_eq!(second, Err(InvokeError::Closed));
    drop(host_in);
    Ok(())
}

#[tokio::test]
async fn wire_log_records_both_directions() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let log_path = dir.path().join("wire").join("log.jsonl");

    let (client_stream, server_stream) = tokio::io::duplex(16 * 1024);
    let (client_read, client_write) = tokio::io::split(client_stream);
    let (server_read, mut server_write) = tokio::io::split(server_stream);
    let client = WalletApiClient::connect_with_io(
        Box::new(client_write),
        Box::new(client_read),
        Some(WireLog::open(log_path.clone())),
    );

    let server = tokio::spawn(async move {
        let mut reader = BufReader::new(server_read);
        let mut request_line = String::new();
        reader.read_line(&mut request_line).await?;
        let request: Value = serde_json::from_str(request_line.trim())?;
        let response = json!({ "jsonrpc": "2.0", "id": request["id"].clone(), "result": "nonce-1" });
        server_write
            .write_all(format!("{}\n", serde_json::to_string(&response)?).as_bytes())
            .await?;
        Ok::<(), anyhow::Error>(())
    });

    let nonce = client
        .start_exchange(wallet_api_client::ExchangeType::Swap)
        .await?;
    assert_eq!(nonce, "nonce-1");
    server.await??;

    let mut lines = Vec::new();
    for _ in 0..50 {
        let contents = tokio::fs::read_to_string(&log_path).await.unwrap_or_default();
        lines = contents.lines().map(str::to_string).collect::<Vec<_>>();
        if lines.len() >= 2 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(lines.len(), 2);
    let outbound: Value = serde_json::from_str(&lines[0])?;
    let inbound: Value = serde_json::from_str(&lines[1])?;
    assert_eq!(outbound["direction"], json!("out"));
    assert_eq!(inbound["direction"], json!("in"));
    Ok(())
}

//! Integration tests for analysis-router-mcp, driven through the protocol handler.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::Mutex;

use analysis_router::{
    AnalysisRouter, DatasetFetcher, EndpointRegistry, MemoryFetcher, RawRecord, RouterResult,
};
use analysis_router_mcp::protocol::ProtocolHandler;
use analysis_router_mcp::session::{DirectoryFetcher, RoutingSessionManager};
use analysis_router_mcp::transport::{framing, StdioTransport};
use analysis_router_mcp::types::*;

// ─────────────────────── helpers ───────────────────────

fn record(v: Value) -> RawRecord {
    match v {
        Value::Object(map) => map,
        _ => panic!("record must be an object"),
    }
}

fn strategic_records() -> Vec<RawRecord> {
    vec![
        record(json!({ "ID": "H2X", "DESCRIPTION": "Plateau", "strategic_value_score": 81.2 })),
        record(json!({ "ID": "H3A", "DESCRIPTION": "Downtown", "strategic_value_score": 92.0 })),
        record(json!({ "ID": "H4C", "DESCRIPTION": "Saint-Henri", "population": 25000 })),
    ]
}

fn demographic_records() -> Vec<RawRecord> {
    vec![
        record(json!({ "ID": "H2X", "DESCRIPTION": "Plateau", "demographic_insights_score": 55.0 })),
        record(json!({ "ID": "H3A", "DESCRIPTION": "Downtown", "demographic_insights_score": 71.5 })),
    ]
}

fn session_with(
    fetcher: Option<Arc<dyn DatasetFetcher>>,
    timeout: Duration,
) -> Arc<Mutex<RoutingSessionManager>> {
    let registry = EndpointRegistry::builtin().unwrap();
    let session = RoutingSessionManager::new(AnalysisRouter::new(Arc::new(registry)), fetcher, timeout);
    Arc::new(Mutex::new(session))
}

fn memory_handler() -> ProtocolHandler {
    let fetcher = MemoryFetcher::new()
        .with_dataset("strategic-analysis", strategic_records())
        .with_dataset("demographic-insights", demographic_records());
    ProtocolHandler::new(session_with(Some(Arc::new(fetcher)), Duration::from_secs(5)))
}

fn mcp_request(id: i64, method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params
    })
}

fn tool_call(id: i64, name: &str, arguments: Value) -> Value {
    mcp_request(id, "tools/call", json!({ "name": name, "arguments": arguments }))
}

async fn send(handler: &ProtocolHandler, msg: Value) -> Option<Value> {
    let parsed: JsonRpcMessage = serde_json::from_value(msg).unwrap();
    handler.handle_message(parsed).await
}

async fn send_unwrap(handler: &ProtocolHandler, msg: Value) -> Value {
    send(handler, msg).await.expect("expected response")
}

/// Parse the JSON text payload of a successful tool call.
fn tool_payload(response: &Value) -> Value {
    assert!(
        response.get("error").is_none(),
        "unexpected error: {response}"
    );
    let text = response["result"]["content"][0]["text"].as_str().unwrap();
    serde_json::from_str(text).unwrap()
}

fn error_code(response: &Value) -> i64 {
    response["error"]["code"].as_i64().expect("expected error response")
}

/// Fetcher that takes longer than any test timeout.
struct SlowFetcher;

impl DatasetFetcher for SlowFetcher {
    fn fetch(&self, _endpoint_id: &str) -> RouterResult<Vec<RawRecord>> {
        std::thread::sleep(Duration::from_millis(500));
        Ok(Vec::new())
    }
}

// ═══════════════════════════════════════════════════════
// PROTOCOL
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn test_malformed_json_is_parse_error() {
    let err = framing::parse_message("{not json").unwrap_err();
    assert_eq!(err.code(), error_codes::PARSE_ERROR);

    let err = framing::parse_message("   ").unwrap_err();
    assert_eq!(err.code(), error_codes::PARSE_ERROR);
}

#[tokio::test]
async fn test_future_protocol_version_is_answered_with_ours() {
    let handler = memory_handler();
    let resp = send_unwrap(
        &handler,
        mcp_request(
            0,
            "initialize",
            json!({
                "protocolVersion": "2099-01-01",
                "capabilities": {},
                "clientInfo": { "name": "test-client", "version": "1.0" }
            }),
        ),
    )
    .await;

    assert_eq!(resp["result"]["protocolVersion"], MCP_VERSION);
    assert_eq!(resp["result"]["serverInfo"]["name"], SERVER_NAME);
}

#[tokio::test]
async fn test_unknown_method_and_tool() {
    let handler = memory_handler();

    let resp = send_unwrap(&handler, mcp_request(1, "map/render", json!({}))).await;
    assert_eq!(error_code(&resp), error_codes::METHOD_NOT_FOUND as i64);

    let resp = send_unwrap(&handler, tool_call(2, "render_map", json!({}))).await;
    assert_eq!(error_code(&resp), mcp_error_codes::TOOL_NOT_FOUND as i64);
}

#[tokio::test]
async fn test_scalar_params_rejected() {
    let handler = memory_handler();
    let resp = send_unwrap(&handler, mcp_request(1, "tools/list", json!(42))).await;
    assert_eq!(error_code(&resp), error_codes::INVALID_REQUEST as i64);
}

#[tokio::test]
async fn test_lists_tools_resources_prompts() {
    let handler = memory_handler();

    let tools = send_unwrap(&handler, mcp_request(1, "tools/list", json!({}))).await;
    let names: Vec<&str> = tools["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names.len(), 8);
    assert!(names.contains(&"analyze_query"));

    let resources = send_unwrap(&handler, mcp_request(2, "resources/list", json!({}))).await;
    assert_eq!(resources["result"]["resources"].as_array().unwrap().len(), 2);

    let templates =
        send_unwrap(&handler, mcp_request(3, "resources/templates/list", json!({}))).await;
    assert_eq!(
        templates["result"]["resourceTemplates"][0]["uriTemplate"],
        "routing://endpoint/{id}"
    );

    let prompts = send_unwrap(&handler, mcp_request(4, "prompts/list", json!({}))).await;
    assert_eq!(prompts["result"]["prompts"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_notification_gets_no_response() {
    let handler = memory_handler();
    let resp = send(
        &handler,
        json!({ "jsonrpc": "2.0", "method": "notifications/cancelled" }),
    )
    .await;
    assert!(resp.is_none());
}

// ═══════════════════════════════════════════════════════
// ROUTING
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn test_route_query_phrase_beats_keywords() {
    let handler = memory_handler();
    let resp = send_unwrap(
        &handler,
        tool_call(
            1,
            "route_query",
            json!({ "query": "Show the market opportunity by age, income and population" }),
        ),
    )
    .await;

    let routing = tool_payload(&resp);
    assert_eq!(routing["bestEndpoint"], "strategic-analysis");
    assert_eq!(routing["fallback"], false);
    assert_eq!(routing["rankedEndpoints"][1]["endpointId"], "demographic-insights");
}

#[tokio::test]
async fn test_route_query_falls_back_for_empty_and_unicode_queries() {
    let handler = memory_handler();

    for query in ["", "   ", "où sont les 🏙️ ?"] {
        let resp = send_unwrap(&handler, tool_call(1, "route_query", json!({ "query": query }))).await;
        let routing = tool_payload(&resp);
        assert_eq!(routing["bestEndpoint"], "analyze", "query {query:?}");
        assert_eq!(routing["fallback"], true);
    }
}

#[tokio::test]
async fn test_route_query_missing_query_is_invalid_params() {
    let handler = memory_handler();
    let resp = send_unwrap(&handler, tool_call(1, "route_query", json!({ "q": "x" }))).await;
    assert_eq!(error_code(&resp), error_codes::INVALID_PARAMS as i64);
}

#[tokio::test]
async fn test_route_query_unknown_current_endpoint() {
    let handler = memory_handler();
    let resp = send_unwrap(
        &handler,
        tool_call(1, "route_query", json!({ "query": "income", "current_endpoint": "nope" })),
    )
    .await;
    assert_eq!(error_code(&resp), mcp_error_codes::ENDPOINT_NOT_FOUND as i64);
}

#[tokio::test]
async fn test_cross_references_need_a_current_endpoint() {
    let handler = memory_handler();

    let resp = send_unwrap(
        &handler,
        tool_call(1, "detect_cross_references", json!({ "query": "and the competitive landscape?" })),
    )
    .await;
    assert_eq!(error_code(&resp), error_codes::INVALID_PARAMS as i64);

    let resp = send_unwrap(
        &handler,
        tool_call(
            2,
            "detect_cross_references",
            json!({
                "query": "and the competitive landscape?",
                "current_endpoint": "strategic-analysis"
            }),
        ),
    )
    .await;
    let payload = tool_payload(&resp);
    let first = &payload["crossReferences"][0];
    assert_eq!(first["endpointId"], "competitive-analysis");
    assert_eq!(first["shouldFetch"], true);
    assert!(first["reason"].as_str().unwrap().contains("competitive landscape"));
}

// ═══════════════════════════════════════════════════════
// NORMALIZATION
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn test_normalize_records_flags_missing_scores() {
    let handler = memory_handler();
    let resp = send_unwrap(
        &handler,
        tool_call(
            1,
            "normalize_records",
            json!({ "endpoint_id": "strategic-analysis", "records": strategic_records() }),
        ),
    )
    .await;

    let view = tool_payload(&resp);
    assert_eq!(view["recordCount"], 3);
    assert_eq!(view["flaggedRecords"], 1);
    assert_eq!(view["points"][0]["areaId"], "H3A");
    assert_eq!(view["points"][0]["rank"], 1);
    assert_eq!(view["points"][2]["properties"]["scoreExtractionFailed"], true);
    assert_eq!(view["legend"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_normalize_records_unknown_endpoint() {
    let handler = memory_handler();
    let resp = send_unwrap(
        &handler,
        tool_call(1, "normalize_records", json!({ "endpoint_id": "nope", "records": [] })),
    )
    .await;
    assert_eq!(error_code(&resp), mcp_error_codes::ENDPOINT_NOT_FOUND as i64);
}

#[tokio::test]
async fn test_normalize_records_rejects_non_object_records() {
    let handler = memory_handler();
    let resp = send_unwrap(
        &handler,
        tool_call(1, "normalize_records", json!({ "endpoint_id": "analyze", "records": [1, 2] })),
    )
    .await;
    assert_eq!(error_code(&resp), error_codes::INVALID_PARAMS as i64);
}

#[tokio::test]
async fn test_compute_breaks_tool() {
    let handler = memory_handler();
    let resp = send_unwrap(
        &handler,
        tool_call(1, "compute_breaks", json!({ "values": [10, 20, 30, 40] })),
    )
    .await;

    let payload = tool_payload(&resp);
    assert_eq!(payload["breaks"], json!([10.0, 10.0, 20.0, 30.0, 40.0]));
    assert_eq!(payload["categories"].as_array().unwrap().len(), 4);
}

// ═══════════════════════════════════════════════════════
// FETCH & CONTEXT
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn test_analyze_query_merges_cross_references() {
    let handler = memory_handler();

    let first = tool_payload(
        &send_unwrap(
            &handler,
            tool_call(1, "analyze_query", json!({ "query": "where is the strategic opportunity?" })),
        )
        .await,
    );
    assert_eq!(first["currentEndpoint"], "strategic-analysis");
    assert_eq!(first["merged"][0]["endpointId"], "strategic-analysis");

    let second = tool_payload(
        &send_unwrap(
            &handler,
            tool_call(2, "analyze_query", json!({ "query": "how does income look in those areas" })),
        )
        .await,
    );
    assert_eq!(second["currentEndpoint"], "strategic-analysis");
    assert_eq!(second["merged"][0]["endpointId"], "demographic-insights");
    assert_eq!(second["merged"][0]["reason"]["kind"], "crossReference");

    let ctx = send_unwrap(
        &handler,
        mcp_request(3, "resources/read", json!({ "uri": "routing://context" })),
    )
    .await;
    let text = ctx["result"]["contents"][0]["text"].as_str().unwrap();
    let summary: Value = serde_json::from_str(text).unwrap();
    assert_eq!(summary["turnCount"], 2);
    assert_eq!(summary["datasets"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_fetch_endpoint_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("trend-analysis.json"),
        json!({ "success": true, "results": [
            { "ID": "A", "DESCRIPTION": "Alpha", "trend_score": 3.5, "geometry": { "type": "Point" } },
            { "ID": "B", "DESCRIPTION": "Beta", "trend_strength_score": 7.0 }
        ]})
        .to_string(),
    )
    .unwrap();

    let fetcher: Arc<dyn DatasetFetcher> = Arc::new(DirectoryFetcher::new(dir.path()));
    let handler = ProtocolHandler::new(session_with(Some(fetcher), Duration::from_secs(5)));

    let resp = send_unwrap(
        &handler,
        tool_call(1, "fetch_endpoint", json!({ "endpoint_id": "trend-analysis" })),
    )
    .await;
    let payload = tool_payload(&resp);
    assert_eq!(payload["merged"], true);
    assert_eq!(payload["dataset"]["points"][0]["areaId"], "B");
    assert_eq!(payload["dataset"]["targetVariable"], "trend_strength_score");

    let dataset = send_unwrap(
        &handler,
        mcp_request(2, "resources/read", json!({ "uri": "routing://dataset/trend-analysis" })),
    )
    .await;
    let text = dataset["result"]["contents"][0]["text"].as_str().unwrap();
    let view: Value = serde_json::from_str(text).unwrap();
    assert_eq!(view["recordCount"], 2);
    assert_eq!(view["points"][1]["coordinates"]["type"], "Point");
}

#[tokio::test]
async fn test_fetch_missing_dataset_file_is_fetch_failed() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher: Arc<dyn DatasetFetcher> = Arc::new(DirectoryFetcher::new(dir.path()));
    let handler = ProtocolHandler::new(session_with(Some(fetcher), Duration::from_secs(5)));

    let resp = send_unwrap(
        &handler,
        tool_call(1, "fetch_endpoint", json!({ "endpoint_id": "analyze" })),
    )
    .await;
    assert_eq!(error_code(&resp), mcp_error_codes::FETCH_FAILED as i64);
}

#[tokio::test]
async fn test_fetch_timeout_is_fetch_failed() {
    let handler = ProtocolHandler::new(session_with(
        Some(Arc::new(SlowFetcher)),
        Duration::from_millis(50),
    ));

    let resp = send_unwrap(
        &handler,
        tool_call(1, "fetch_endpoint", json!({ "endpoint_id": "analyze" })),
    )
    .await;
    assert_eq!(error_code(&resp), mcp_error_codes::FETCH_FAILED as i64);
    assert!(resp["error"]["message"].as_str().unwrap().contains("timed out"));

    let session = handler.session().lock().await;
    assert!(session.context().current_endpoint().is_none());
}

#[tokio::test]
async fn test_fetch_without_data_dir() {
    let handler = ProtocolHandler::new(session_with(None, Duration::from_secs(1)));
    let resp = send_unwrap(
        &handler,
        tool_call(1, "analyze_query", json!({ "query": "strategic opportunity" })),
    )
    .await;
    assert_eq!(error_code(&resp), mcp_error_codes::FETCH_FAILED as i64);
}

#[tokio::test]
async fn test_context_reset_clears_datasets() {
    let handler = memory_handler();
    send_unwrap(
        &handler,
        tool_call(1, "analyze_query", json!({ "query": "strategic opportunity" })),
    )
    .await;

    let reset = tool_payload(&send_unwrap(&handler, tool_call(2, "context_reset", json!({}))).await);
    assert_ne!(reset["previousContextId"], reset["contextId"]);

    let resp = send_unwrap(
        &handler,
        mcp_request(3, "resources/read", json!({ "uri": "routing://dataset/strategic-analysis" })),
    )
    .await;
    assert_eq!(error_code(&resp), mcp_error_codes::RESOURCE_NOT_FOUND as i64);
}

#[tokio::test]
async fn test_endpoint_resource() {
    let handler = memory_handler();

    let resp = send_unwrap(
        &handler,
        mcp_request(1, "resources/read", json!({ "uri": "routing://endpoint/trend-analysis" })),
    )
    .await;
    let text = resp["result"]["contents"][0]["text"].as_str().unwrap();
    let sig: Value = serde_json::from_str(text).unwrap();
    assert_eq!(sig["targetVariableName"], "trend_strength_score");

    let resp = send_unwrap(
        &handler,
        mcp_request(2, "resources/read", json!({ "uri": "routing://endpoint/nope" })),
    )
    .await;
    assert_eq!(error_code(&resp), mcp_error_codes::ENDPOINT_NOT_FOUND as i64);
}

#[tokio::test]
async fn test_list_endpoints_by_priority() {
    let handler = memory_handler();
    let payload = tool_payload(
        &send_unwrap(&handler, tool_call(1, "list_endpoints", json!({ "priority": "high" }))).await,
    );
    assert_eq!(payload["defaultEndpoint"], "analyze");
    assert_eq!(payload["total"], 3);
}

// ═══════════════════════════════════════════════════════
// PROMPTS & TRANSPORT
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn test_narrate_prompt() {
    let handler = memory_handler();

    let resp = send_unwrap(
        &handler,
        mcp_request(1, "prompts/get", json!({ "name": "narrate", "arguments": {} })),
    )
    .await;
    assert_eq!(error_code(&resp), error_codes::INVALID_PARAMS as i64);

    let resp = send_unwrap(
        &handler,
        mcp_request(
            2,
            "prompts/get",
            json!({ "name": "narrate", "arguments": { "endpoint_id": "trend-analysis" } }),
        ),
    )
    .await;
    let text = resp["result"]["messages"][0]["content"]["text"].as_str().unwrap();
    assert!(text.contains("routing://dataset/trend-analysis"));
}

#[tokio::test]
async fn test_stdio_serve_answers_each_line() {
    let transport = StdioTransport::new(memory_handler());
    let input = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
        "\n",
        "\n",
        "garbage\n",
        r#"{"jsonrpc":"2.0","method":"initialized"}"#,
        "\n",
    );
    let mut output = Vec::new();
    transport.serve(input.as_bytes(), &mut output).await.unwrap();

    let lines: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["id"], 1);
    assert_eq!(lines[1]["id"], Value::Null);
    assert_eq!(error_code(&lines[1]), error_codes::PARSE_ERROR as i64);
}

#[tokio::test]
async fn test_stdio_serve_with_mock_io() {
    let transport = StdioTransport::new(memory_handler());
    let io = tokio_test::io::Builder::new()
        .read(b"{\"jsonrpc\":\"2.0\",\"id\":7,\"method\":\"ping\"}\n")
        .write(b"{\"id\":7,\"jsonrpc\":\"2.0\",\"result\":{}}\n")
        .build();
    let (reader, writer) = tokio::io::split(io);
    transport
        .serve(tokio::io::BufReader::new(reader), writer)
        .await
        .unwrap();
}

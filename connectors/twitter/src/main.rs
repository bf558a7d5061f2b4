//! Twitter tools - stdio entrypoint
//!
//! Reads one JSON request per line from stdin and writes one JSON response
//! per line to stdout. Logs go to stderr.

#![forbid(unsafe_code)]

use std::io::{BufRead, Write};

use anyhow::Result;
use fcp_twitter_tools::{TwitterConfig, TwitterError, TwitterTools};
use serde_json::{Value, json};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Twitter tools starting");

    run_loop()?;

    Ok(())
}

/// Serve requests until stdin closes.
fn run_loop() -> Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let tools = TwitterTools::new(TwitterConfig::from_env());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let response = runtime.block_on(handle_message(&tools, &line));

        let response_json = serde_json::to_string(&response)?;
        writeln!(stdout, "{response_json}")?;
        stdout.flush()?;
    }

    Ok(())
}

async fn handle_message(tools: &TwitterTools, message: &str) -> Value {
    let request: Value = match serde_json::from_str(message) {
        Ok(v) => v,
        Err(e) => {
            return json!({
                "error": {
                    "code": "invalid_json",
                    "message": format!("Invalid JSON: {e}")
                }
            });
        }
    };

    let method = request.get("method").and_then(Value::as_str).unwrap_or("");
    let id = request.get("id").cloned();
    let params = request.get("params").cloned().unwrap_or_else(|| json!({}));

    let result = match method {
        "list_tools" => Ok(json!({ "tools": tools.catalog().definitions() })),
        "health" => Ok(tools.health()),
        "invoke" => {
            let name = params.get("tool").and_then(Value::as_str).unwrap_or("");
            let args = params.get("args").cloned().unwrap_or(Value::Null);
            tools.invoke(name, args).await
        }
        _ => {
            let mut response = json!({
                "jsonrpc": "2.0",
                "error": {
                    "code": "unknown_method",
                    "message": format!("Unknown method: {method}")
                }
            });
            if let Some(id) = id {
                response["id"] = id;
            }
            return response;
        }
    };

    let mut response = match result {
        Ok(value) => json!({ "jsonrpc": "2.0", "result": value }),
        Err(e) => json!({
            "jsonrpc": "2.0",
            "error": {
                "code": error_code(&e),
                "message": e.to_string(),
                "retry_after_secs": e.retry_after().map(|d| d.as_secs()),
            }
        }),
    };
    if let Some(id) = id {
        response["id"] = id;
    }
    response
}

const fn error_code(error: &TwitterError) -> &'static str {
    match error {
        TwitterError::Configuration(_) => "configuration",
        TwitterError::Validation { .. } => "validation",
        TwitterError::UnknownTool(_) => "unknown_tool",
        TwitterError::Api { .. } => "api",
        TwitterError::Http(_) => "http",
        TwitterError::Json(_) => "json",
        TwitterError::OAuth(_) => "oauth",
        TwitterError::Unimplemented(_) => "unimplemented",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fcp_twitter_tools::Credentials;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    fn tools(api_url: &str) -> TwitterTools {
        TwitterTools::new(TwitterConfig {
            api_url: api_url.to_string(),
            ..TwitterConfig::new(Credentials::new("key", "secret"))
        })
    }

    #[tokio::test]
    async fn test_list_tools_in_catalog_order() {
        let tools = tools("http://127.0.0.1:1");
        let response = handle_message(&tools, r#"{"id": 1, "method": "list_tools"}"#).await;

        assert_eq!(response["id"], 1);
        assert_eq!(response["jsonrpc"], "2.0");
        let listed = response["result"]["tools"].as_array().unwrap();
        assert_eq!(listed.len(), 9);
        assert_eq!(listed[0]["name"], "get_profile");
        assert_eq!(listed[8]["name"], "get_trends");
        assert_eq!(listed[0]["parameters"]["required"], json!(["username"]));
    }

    #[tokio::test]
    async fn test_health_reports_state() {
        let tools = tools("http://127.0.0.1:1");
        let response = handle_message(&tools, r#"{"id": "h", "method": "health"}"#).await;

        assert_eq!(response["id"], "h");
        assert_eq!(response["result"]["state"], "uninitialized");
        assert_eq!(response["result"]["metrics"]["requests_total"], 0);
    }

    #[tokio::test]
    async fn test_invoke_returns_tool_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2/users/by/username/alice"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"id": "u1", "name": "Alice", "username": "alice"}
            })))
            .mount(&server)
            .await;
        let tools = tools(&server.uri());

        let response = handle_message(
            &tools,
            r#"{"id": 7, "method": "invoke", "params": {"tool": "get_profile", "args": {"username": "alice"}}}"#,
        )
        .await;

        assert_eq!(response["id"], 7);
        assert_eq!(response["result"]["username"], "alice");
        assert_eq!(response["result"]["display_name"], "Alice");
        assert!(response.get("error").is_none());
    }

    #[tokio::test]
    async fn test_invoke_error_codes() {
        let tools = tools("http://127.0.0.1:1");
        let cases = [
            (r#"{"tool": "delete_tweet"}"#, "unknown_tool"),
            (r#"{"tool": "get_profile", "args": {}}"#, "validation"),
            (r#"{"tool": "get_trends"}"#, "unimplemented"),
        ];

        for (params, code) in cases {
            let message = format!(r#"{{"id": 2, "method": "invoke", "params": {params}}}"#);
            let response = handle_message(&tools, &message).await;
            assert_eq!(response["error"]["code"], code, "params: {params}");
            assert_eq!(response["id"], 2);
        }

        let unconfigured = TwitterTools::new(TwitterConfig::default());
        let response = handle_message(
            &unconfigured,
            r#"{"method": "invoke", "params": {"tool": "retweet", "args": {"id": "1"}}}"#,
        )
        .await;
        assert_eq!(response["error"]["code"], "configuration");
        assert!(response.get("id").is_none());
    }

    #[tokio::test]
    async fn test_rate_limit_error_carries_code() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2/tweets/1"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;
        let tools = tools(&server.uri());

        let response = handle_message(
            &tools,
            r#"{"method": "invoke", "params": {"tool": "get_tweet", "args": {"id": "1"}}}"#,
        )
        .await;
        assert_eq!(response["error"]["code"], "api");
        assert!(response["error"]["message"].as_str().unwrap().contains("429"));
    }

    #[tokio::test]
    async fn test_malformed_requests() {
        let tools = tools("http://127.0.0.1:1");

        let response = handle_message(&tools, "{not json").await;
        assert_eq!(response["error"]["code"], "invalid_json");

        let response = handle_message(&tools, r#"{"id": 3, "method": "shutdown"}"#).await;
        assert_eq!(response["error"]["code"], "unknown_method");
        assert_eq!(response["id"], 3);
    }
}

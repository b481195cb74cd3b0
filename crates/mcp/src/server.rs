//! Line-delimited JSON-RPC server loop.
//!
//! Reads one JSON-RPC message per line and writes one response per line.
//! Notifications are handled but never answered. Logs go to stderr through
//! `tracing`; the writer carries protocol traffic only.

use mdatlas_core::{AppConfig, AppError, AppResult};
use mdatlas_outline::{AccessControl, StructureCache, StructureManager};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::protocol::{
    JsonRpcRequest, JsonRpcResponse, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST,
    JSONRPC_VERSION, METHOD_NOT_FOUND, PARSE_ERROR, PROTOCOL_VERSION, SERVER_NAME,
};
use crate::resources::ResourceHandler;
use crate::tools::{list_tools, ToolHandler};

#[derive(Debug, Clone)]
pub struct McpServer {
    tools: ToolHandler,
    resources: ResourceHandler,
    cache: Arc<StructureCache>,
}

impl McpServer {
    /// Build a server for `config.base_dir` with its own structure cache.
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let access = Arc::new(AccessControl::new(&config.base_dir, &config.access)?);
        let cache = Arc::new(StructureCache::new(config.cache.clone()));
        Ok(Self::with_parts(access, cache))
    }

    pub fn with_parts(access: Arc<AccessControl>, cache: Arc<StructureCache>) -> Self {
        let manager = StructureManager::new(Some(Arc::clone(&cache)));
        Self {
            tools: ToolHandler::new(Arc::clone(&access), manager.clone()),
            resources: ResourceHandler::new(access, manager),
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<StructureCache> {
        &self.cache
    }

    /// Serve on stdin/stdout until stdin closes.
    pub async fn serve_stdio(&self) -> AppResult<()> {
        self.run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Serve requests from `reader` until end of input.
    ///
    /// The cache sweeper runs for the lifetime of the call.
    pub async fn run<R, W>(&self, reader: R, mut writer: W) -> AppResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        tracing::info!("MCP server started");
        let sweeper = self.cache.spawn_sweeper();

        let result = self.serve(reader, &mut writer).await;

        sweeper.shutdown().await;
        tracing::info!("MCP server stopped");
        result
    }

    async fn serve<R, W>(&self, reader: R, writer: &mut W) -> AppResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            let line = line.trim().to_string();
            if line.is_empty() {
                continue;
            }

            // Handlers read files synchronously.
            let server = self.clone();
            let response = tokio::task::spawn_blocking(move || server.handle_line(&line))
                .await
                .map_err(|e| AppError::Other(format!("Request handler panicked: {}", e)))?;

            if let Some(response) = response {
                let mut payload = serde_json::to_vec(&response)?;
                payload.push(b'\n');
                writer.write_all(&payload).await?;
                writer.flush().await?;
            }
        }

        Ok(())
    }

    /// Handle one raw line. Returns `None` for notifications.
    pub fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to parse request: {}", e);
                return Some(
                    JsonRpcResponse::error(Value::Null, PARSE_ERROR, "Parse error")
                        .with_data(e.to_string()),
                );
            }
        };

        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                return Some(
                    JsonRpcResponse::error(Value::Null, INVALID_REQUEST, "Invalid request")
                        .with_data(e.to_string()),
                );
            }
        };

        self.handle_request(request)
    }

    pub fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let notification = request.is_notification();
        let id = request.id.clone().unwrap_or(Value::Null);
        tracing::debug!("Received request: method={}", request.method());

        let response = self.dispatch(id, &request);
        if notification {
            tracing::debug!("Notification {} handled", request.method());
            return None;
        }
        Some(response)
    }

    fn dispatch(&self, id: Value, request: &JsonRpcRequest) -> JsonRpcResponse {
        if request.jsonrpc.as_deref() != Some(JSONRPC_VERSION) {
            return JsonRpcResponse::error(id, INVALID_REQUEST, "Invalid request: jsonrpc must be \"2.0\"");
        }
        if request.method().is_empty() {
            return JsonRpcResponse::error(id, INVALID_REQUEST, "Invalid request: missing method");
        }

        let params = request.params.clone().unwrap_or(Value::Null);
        match request.method() {
            "initialize" => JsonRpcResponse::success(
                id,
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {
                        "tools": {},
                        "resources": {}
                    },
                    "serverInfo": {
                        "name": SERVER_NAME,
                        "version": env!("CARGO_PKG_VERSION")
                    }
                }),
            ),
            "notifications/initialized" | "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(id, json!({ "tools": list_tools() })),
            "tools/call" => self.call_tool(id, params),
            "resources/list" => match self.resources.list() {
                Ok(resources) => JsonRpcResponse::success(id, json!({ "resources": resources })),
                Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, "Failed to list resources")
                    .with_data(e.to_string()),
            },
            "resources/read" => self.read_resource(id, params),
            method => {
                tracing::warn!("Unknown method: {}", method);
                JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("Method not found: {}", method))
            }
        }
    }

    fn call_tool(&self, id: Value, params: Value) -> JsonRpcResponse {
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing tool name");
        };
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

        let result = self.tools.call(name, arguments);
        match serde_json::to_value(&result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, "Failed to encode tool result")
                .with_data(e.to_string()),
        }
    }

    fn read_resource(&self, id: Value, params: Value) -> JsonRpcResponse {
        let Some(uri) = params.get("uri").and_then(Value::as_str) else {
            return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing resource URI");
        };

        match self.resources.read(uri) {
            Ok(contents) => JsonRpcResponse::success(id, json!({ "contents": [contents] })),
            Err(AppError::Protocol(message)) => JsonRpcResponse::error(id, INVALID_PARAMS, message),
            Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, "Failed to read resource")
                .with_data(e.to_string()),
        }
    }
}

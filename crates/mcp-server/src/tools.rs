//! MCP tools for the Recall memory store.
//!
//! - `add_to_memory` - embed and store a text item
//! - `search_memory` - rank stored items by cosine, euclidean or DTS
//! - `forget_memory` - remove one item by id
//! - `clear_memory` - remove everything

use recall_vector_store::{Metadata, MemoryStore, SearchMethod, SearchOptions};
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::schemars;
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Recall MCP Service
#[derive(Clone)]
pub struct MemoryService {
    /// Store access is serialized; the store itself assumes one operation at a time.
    state: Arc<Mutex<StoreState>>,
    /// Tool router
    tool_router: ToolRouter<Self>,
}

struct StoreState {
    store: Box<dyn MemoryStore>,
    warmed: bool,
}

impl MemoryService {
    pub fn new(store: Box<dyn MemoryStore>) -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState {
                store,
                warmed: false,
            })),
            tool_router: Self::tool_router(),
        }
    }

    /// Lock the store, warming it first if it asks for that.
    async fn ready_store(&self) -> Result<tokio::sync::MutexGuard<'_, StoreState>, String> {
        let mut state = self.state.lock().await;
        if !state.warmed && state.store.capabilities().warm_up {
            state
                .store
                .initialize()
                .await
                .map_err(|e| format!("Failed to initialize memory store: {e}"))?;
            state.warmed = true;
        }
        Ok(state)
    }
}

#[tool_handler]
impl ServerHandler for MemoryService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some("Recall is a semantic memory store. Use 'add_to_memory' to remember text, 'search_memory' to retrieve similar memories (methods: cosine, euclidean, dts), 'forget_memory' to drop one memory by id, and 'clear_memory' to wipe the store.".into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            ..Default::default()
        }
    }
}

// ============================================================================
// Tool Input/Output Schemas
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddToMemoryRequest {
    /// The text content to store
    #[schemars(description = "The text content to store")]
    pub content: String,

    /// Optional metadata
    #[schemars(description = "Optional metadata for the memory item")]
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Clone, Copy, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SearchMethodArg {
    Cosine,
    Euclidean,
    Dts,
}

impl From<SearchMethodArg> for SearchMethod {
    fn from(arg: SearchMethodArg) -> Self {
        match arg {
            SearchMethodArg::Cosine => Self::Cosine,
            SearchMethodArg::Euclidean => Self::Euclidean,
            SearchMethodArg::Dts => Self::Dts,
        }
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchMemoryRequest {
    /// Search query
    #[schemars(description = "The search query")]
    pub query: String,

    /// Ranking method (default: dts)
    #[schemars(description = "Search method: cosine, euclidean or dts (default: dts)")]
    pub method: Option<SearchMethodArg>,

    /// Maximum results (default: 5)
    #[schemars(description = "Maximum number of results to return (default: 5)")]
    pub limit: Option<usize>,

    /// Score cut-off
    #[schemars(
        description = "Optional score cut-off: minimum similarity for cosine, maximum distance for euclidean/dts"
    )]
    pub min_score: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MemoryHit {
    pub id: String,
    pub content: String,
    /// Similarity (cosine) or distance (euclidean, dts)
    pub score: f32,
    pub metadata: Metadata,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ForgetMemoryRequest {
    /// Memory id
    #[schemars(description = "The unique ID of the memory item to forget")]
    pub id: String,
}

fn tool_error(message: impl std::fmt::Display) -> CallToolResult {
    CallToolResult::error(vec![Content::text(format!("Error: {message}"))])
}

#[tool_router]
impl MemoryService {
    #[tool(description = "Store information in vector memory")]
    pub async fn add_to_memory(
        &self,
        Parameters(request): Parameters<AddToMemoryRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut state = match self.ready_store().await {
            Ok(s) => s,
            Err(e) => return Ok(tool_error(e)),
        };

        let record = match state.store.add(&request.content, request.metadata).await {
            Ok(r) => r,
            Err(e) => return Ok(tool_error(e)),
        };

        Ok(CallToolResult::success(vec![Content::text(format!(
            "Successfully added to memory (ID: {}). Contents: \"{}\"",
            record.id, request.content
        ))]))
    }

    #[tool(description = "Retrieve information from vector memory using similarity or DTS search")]
    pub async fn search_memory(
        &self,
        Parameters(request): Parameters<SearchMemoryRequest>,
    ) -> Result<CallToolResult, McpError> {
        if request.query.trim().is_empty() {
            return Ok(tool_error("Query cannot be empty"));
        }

        let mut options = SearchOptions::default();
        if let Some(method) = request.method {
            options.method = method.into();
        }
        if let Some(limit) = request.limit {
            options.limit = limit;
        }
        options.min_score = request.min_score;

        let state = match self.ready_store().await {
            Ok(s) => s,
            Err(e) => return Ok(tool_error(e)),
        };
        let hits = match state.store.search(&request.query, options).await {
            Ok(h) => h,
            Err(e) => return Ok(tool_error(e)),
        };

        if hits.is_empty() {
            return Ok(CallToolResult::success(vec![Content::text(
                "No matching memories found.",
            )]));
        }

        let results: Vec<MemoryHit> = hits
            .into_iter()
            .map(|hit| MemoryHit {
                id: hit.record.id,
                content: hit.record.content,
                score: hit.score,
                metadata: hit.record.metadata,
            })
            .collect();
        let text = serde_json::to_string_pretty(&results)
            .map_err(|e| McpError::internal_error(format!("Serialization error: {e}"), None))?;

        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(description = "Clear all stored memories")]
    pub async fn clear_memory(&self) -> Result<CallToolResult, McpError> {
        let mut state = match self.ready_store().await {
            Ok(s) => s,
            Err(e) => return Ok(tool_error(e)),
        };
        if let Err(e) = state.store.clear().await {
            return Ok(tool_error(e));
        }

        Ok(CallToolResult::success(vec![Content::text(
            "Memory store cleared successfully.",
        )]))
    }

    #[tool(description = "Remove a specific memory item by its ID")]
    pub async fn forget_memory(
        &self,
        Parameters(request): Parameters<ForgetMemoryRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut state = match self.ready_store().await {
            Ok(s) => s,
            Err(e) => return Ok(tool_error(e)),
        };
        if let Err(e) = state.store.forget(&request.id).await {
            return Ok(tool_error(e));
        }

        Ok(CallToolResult::success(vec![Content::text(format!(
            "Successfully forgotten memory with ID: {}",
            request.id
        ))]))
    }
}

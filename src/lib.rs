//! # Tracegraph: structured run capture and graph normalization
//!
//! Tracegraph records one run of a staged computation (prompt formatting,
//! model invocation, output parsing, tool calls, retrieval, ...) as a
//! versioned, replayable [`GraphDocument`](document::GraphDocument), and
//! turns such documents, from any supported producer generation, into a
//! canonical renderable graph with per-node execution artifacts attached.
//!
//! ## Core concepts
//!
//! - **Recorder**: the single writer that builds a document during a run
//! - **Graph document**: the immutable, versioned record of one run
//! - **Normalizer**: deterministic mapping from raw type strings to a fixed
//!   set of canonical categories
//! - **Projector**: version- and category-aware extraction of per-node
//!   artifact views
//! - **Resolver**: live-endpoint vs. snapshot fetching with ordered fallback
//!
//! ## Quick start
//!
//! ### Recording a run
//!
//! ```
//! use serde_json::json;
//! use tracegraph::recorder::Recorder;
//!
//! let mut rec = Recorder::new("01_hello_chain");
//! rec.register_node("prompt", "PromptTemplate", "prompt")?;
//! rec.register_node("llm", "Groq:mixtral-8x7b", "llm")?;
//! rec.register_node("parser", "StrOutputParser", "parser")?;
//! rec.register_edge("prompt", "llm");
//! rec.register_edge("llm", "parser");
//!
//! let step = rec.begin_step_with_input("llm", "Explain X");
//! // ... invoke the model ...
//! rec.end_step_with_output(step, "X is...");
//! rec.attach_artifact(
//!     "llm",
//!     json!({"output": "X is...", "model": "mixtral-8x7b"})
//!         .as_object()
//!         .cloned()
//!         .unwrap(),
//! );
//!
//! let doc = rec.export();
//! assert_eq!(doc.metadata.subject_id, "01_hello_chain");
//! # Ok::<(), tracegraph::recorder::RecorderError>(())
//! ```
//!
//! ### Normalizing for display
//!
//! ```
//! # use tracegraph::recorder::Recorder;
//! use tracegraph::normalize::CanonicalCategory;
//! use tracegraph::render::RenderGraph;
//!
//! # let mut rec = Recorder::new("01_hello_chain");
//! # rec.register_node("llm", "Groq:mixtral-8x7b", "llm").unwrap();
//! # let doc = rec.export();
//! let graph = RenderGraph::from_document(&doc).unwrap();
//! assert_eq!(
//!     graph.node("llm").unwrap().category,
//!     CanonicalCategory::LanguageModel,
//! );
//! ```
//!
//! ### Resolving a document
//!
//! ```no_run
//! use tracegraph::resolver::{LiveEndpoint, SnapshotStore, SourceResolver};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = SourceResolver::new(
//!     LiveEndpoint::new("http://127.0.0.1:8000"),
//!     SnapshotStore::new("./lessons"),
//! );
//! let doc = resolver.resolve("01_hello_chain", true).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error handling
//!
//! Recorder-local anomalies (unmatched steps, dangling edges) never abort a
//! run; they land in the exported run summary so partial traces stay
//! usable. The normalizer and projector never fail on unrecognized input:
//! unknown types become `Unknown` with an empty view. Only an unsupported
//! schema version or the loss of both document sources surface as errors.
//!
//! ## Module guide
//!
//! - [`document`] - the versioned graph document model
//! - [`recorder`] - single-writer run capture
//! - [`resolver`] - live/snapshot document resolution
//! - [`normalize`] - raw type to canonical category mapping
//! - [`project`] - per-node artifact view projection
//! - [`render`] - the renderer consumption contract and Mermaid export
//! - [`styles`] - default per-category visual hints
//! - [`telemetry`] - tracing subscriber setup for embedding hosts

pub mod document;
pub mod normalize;
pub mod project;
pub mod recorder;
pub mod render;
pub mod resolver;
pub mod styles;
pub mod telemetry;
pub mod utils;

//! Failure taxonomy for graph mutations and layout.
//!
//! Every variant is recovered locally by the caller; none of them is surfaced
//! to the user.

use thiserror::Error;

/// Errors raised by the store, the layout pipeline and subgraph sources.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
	/// An edge names a node that is not in the store.
	#[error("edge {edge} references unknown node {node}")]
	UnknownEndpoint {
		/// Offending edge id.
		edge: String,
		/// Missing endpoint id.
		node: String,
	},

	/// The unordered pair already has an edge.
	#[error("an edge already connects {from} and {to}")]
	DuplicateEdge {
		/// One endpoint of the pair.
		from: String,
		/// The other endpoint.
		to: String,
	},

	#[error("node {0} already exists")]
	#[allow(missing_docs)]
	DuplicateNode(String),

	#[error("edge {0} already exists")]
	#[allow(missing_docs)]
	DuplicateEdgeId(String),

	#[error("node {0} does not exist")]
	#[allow(missing_docs)]
	UnknownNode(String),

	/// The layered engine rejected the graph.
	#[error("layered layout unavailable: {0}")]
	LayoutUnavailable(String),

	/// No layered result arrived before the deadline; carries the wait in ms.
	#[error("layered layout timed out after {0} ms")]
	LayoutTimedOut(f64),

	/// Nothing to lay out or fit.
	#[error("graph is empty")]
	EmptyGraph,

	/// The subgraph source could not produce a batch.
	#[error("subgraph source failed for {anchor}: {reason}")]
	SourceUnavailable {
		/// Node being expanded.
		anchor: String,
		/// Source-specific explanation.
		reason: String,
	},
}

/// Result alias for graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;

//! Dataset records fed into the graph view.
//!
//! Records carry an open property bag; only a handful of keys are interpreted
//! and everything else is kept untouched.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

/// Semantic category of a node. Unknown kinds deserialize to [`NodeKind::Other`].
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum NodeKind {
	Person,
	Address,
	Vehicle,
	Event,
	Organization,
	#[default]
	#[serde(other)]
	Other,
}

impl NodeKind {
	/// Lowercase wire name.
	pub fn as_str(self) -> &'static str {
		match self {
			NodeKind::Person => "person",
			NodeKind::Address => "address",
			NodeKind::Vehicle => "vehicle",
			NodeKind::Event => "event",
			NodeKind::Organization => "organization",
			NodeKind::Other => "other",
		}
	}
}

/// One version of a node's display name, with where it came from.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct DisplayName {
	/// The name itself.
	pub value: String,
	/// Higher versions supersede lower ones.
	#[serde(default)]
	pub version: u32,
	/// Opaque origin metadata.
	#[serde(default)]
	pub provenance: Option<Value>,
}

/// A node in the input dataset.
#[derive(Clone, Debug, Deserialize)]
pub struct NodeRecord {
	/// Unique, stable identifier.
	pub id: String,
	/// Category; defaults to [`NodeKind::Other`].
	#[serde(default)]
	pub kind: NodeKind,
	/// Image URL, also accepted as `image`.
	#[serde(default, alias = "image")]
	pub image_ref: Option<String>,
	/// Arbitrary typed properties. Unknown keys are tolerated.
	#[serde(default)]
	pub properties: HashMap<String, Value>,
}

impl NodeRecord {
	/// Record with no properties.
	pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
		Self {
			id: id.into(),
			kind,
			image_ref: None,
			properties: HashMap::new(),
		}
	}

	/// Builder-style helper setting a plain `displayName`.
	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.properties
			.insert("displayName".into(), Value::String(name.into()));
		self
	}

	/// Resolves the label shown next to the node.
	///
	/// `displayName` may be a string, a `{value, version, provenance}` object or
	/// an array of those (highest version wins). Falls back to `name`, then the id.
	pub fn display_label(&self) -> String {
		self.properties
			.get("displayName")
			.and_then(resolve_display_name)
			.or_else(|| {
				self.properties
					.get("name")
					.and_then(Value::as_str)
					.map(str::to_string)
			})
			.unwrap_or_else(|| self.id.clone())
	}

	/// Optional numeric size override.
	pub fn size_hint(&self) -> Option<f64> {
		self.properties
			.get("size")
			.and_then(Value::as_f64)
			.filter(|s| s.is_finite() && *s > 0.0)
	}
}

fn resolve_display_name(value: &Value) -> Option<String> {
	match value {
		Value::String(s) if !s.is_empty() => Some(s.clone()),
		Value::Object(_) => serde_json::from_value::<DisplayName>(value.clone())
			.ok()
			.map(|d| d.value),
		Value::Array(items) => items
			.iter()
			.filter_map(|item| serde_json::from_value::<DisplayName>(item.clone()).ok())
			.max_by_key(|d| d.version)
			.map(|d| d.value),
		_ => None,
	}
}

/// A relation in the input dataset.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRecord {
	/// Unique edge identifier.
	pub id: String,
	/// Source node id, also accepted as `source`.
	#[serde(alias = "source")]
	pub start_id: String,
	/// Target node id, also accepted as `target`.
	#[serde(alias = "target")]
	pub end_id: String,
	/// Arbitrary typed properties.
	#[serde(default)]
	pub properties: HashMap<String, Value>,
}

impl EdgeRecord {
	/// Record joining `start` to `end` with no properties.
	pub fn new(id: impl Into<String>, start: impl Into<String>, end: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			start_id: start.into(),
			end_id: end.into(),
			properties: HashMap::new(),
		}
	}

	/// Relation-kind identifier, if the record carries one.
	pub fn relation_kind(&self) -> Option<&str> {
		self.properties
			.get("relationType")
			.or_else(|| self.properties.get("type"))
			.and_then(Value::as_str)
	}

	/// Label shown for the relation: explicit `label`, else the relation kind.
	pub fn display_label(&self) -> String {
		self.properties
			.get("label")
			.and_then(Value::as_str)
			.or_else(|| self.relation_kind())
			.unwrap_or("related")
			.to_string()
	}
}

/// Complete dataset: an ordered list of nodes and edges.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct GraphData {
	/// Nodes in load order.
	#[serde(default)]
	pub nodes: Vec<NodeRecord>,
	/// Edges in load order, also accepted as `links`.
	#[serde(default, alias = "links")]
	pub edges: Vec<EdgeRecord>,
}

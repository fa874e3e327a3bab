//! Context menu and relation drafting.
//!
//! A secondary click on a node opens a [`ContextMenu`] listing the node's
//! relations for deletion plus the actions available on it. Creating a relation
//! is a three step draft: pick a source, pick a different target, then submit a
//! non-empty label.

use log::{debug, info};

use super::error::Result;
use super::expansion::DeleteMode;
use super::store::{EdgeAttrs, GraphStore};
use super::theme::Theme;

/// What a context-menu row does when chosen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MenuAction {
	/// Remove the edge with this id.
	DeleteRelation(String),
	/// Use the menu's node as the source of a new draft.
	StartRelation,
	/// Use the menu's node as the target of the pending draft.
	CompleteRelation,
	/// Abandon the current draft.
	CancelRelation,
	/// Expand the menu's node.
	Expand,
	/// Collapse the menu's node.
	Collapse,
	/// Delete the menu's node with the given policy.
	DeleteNode(DeleteMode),
}

/// One row of the context menu.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MenuItem {
	/// Row caption.
	pub text: String,
	#[allow(missing_docs)]
	pub action: MenuAction,
}

/// Open context menu, anchored on a node.
#[derive(Clone, Debug, PartialEq)]
pub struct ContextMenu {
	/// Node the menu was opened on.
	pub anchor: String,
	/// Screen position of the top-left corner.
	pub x: f64,
	#[allow(missing_docs)]
	pub y: f64,
	/// Relation rows first, then actions.
	pub items: Vec<MenuItem>,
}

impl ContextMenu {
	/// Number of rows that delete an existing relation.
	pub fn relation_count(&self) -> usize {
		self.items
			.iter()
			.filter(|i| matches!(i.action, MenuAction::DeleteRelation(_)))
			.count()
	}
}

/// Source and target waiting for a label.
#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct PendingRelation {
	pub source: String,
	pub target: String,
}

/// `label: source → target`, using display labels.
pub fn relation_text(store: &GraphStore, edge_id: &str) -> Option<String> {
	let edge = store.edge(edge_id)?;
	let name = |id: &str| store.node(id).map(|n| n.label.clone()).unwrap_or_else(|| id.to_string());
	Some(format!("{}: {} → {}", edge.label, name(&edge.source), name(&edge.target)))
}

/// Context menu state and the relation draft.
#[derive(Clone, Debug, Default)]
pub struct RelationEditor {
	menu: Option<ContextMenu>,
	draft_source: Option<String>,
	pending: Option<PendingRelation>,
	next_id: u64,
}

impl RelationEditor {
	/// The open menu, if any.
	pub fn menu(&self) -> Option<&ContextMenu> {
		self.menu.as_ref()
	}

	/// Source picked for a draft still waiting for its target.
	pub fn draft_source(&self) -> Option<&str> {
		self.draft_source.as_deref()
	}

	/// Relation waiting for its label.
	pub fn pending(&self) -> Option<&PendingRelation> {
		self.pending.as_ref()
	}

	/// Opens the menu for `node` at screen position `(x, y)`.
	pub fn open_menu(&mut self, store: &GraphStore, node: &str, x: f64, y: f64, expanded: bool) -> bool {
		if !store.contains_node(node) {
			self.menu = None;
			return false;
		}

		let mut items: Vec<MenuItem> = store
			.incident_edges(node)
			.into_iter()
			.filter_map(|edge| {
				relation_text(store, &edge).map(|text| MenuItem {
					text: format!("Delete {text}"),
					action: MenuAction::DeleteRelation(edge),
				})
			})
			.collect();

		match self.draft_source.as_deref() {
			Some(source) => {
				let source_label = store.node(source).map(|n| n.label.as_str()).unwrap_or(source);
				items.push(MenuItem {
					text: format!("Relate {source_label} to this"),
					action: MenuAction::CompleteRelation,
				});
				items.push(MenuItem {
					text: "Cancel relation".into(),
					action: MenuAction::CancelRelation,
				});
			}
			None => items.push(MenuItem {
				text: "Start relation".into(),
				action: MenuAction::StartRelation,
			}),
		}
		items.push(if expanded {
			MenuItem { text: "Collapse".into(), action: MenuAction::Collapse }
		} else {
			MenuItem { text: "Expand".into(), action: MenuAction::Expand }
		});
		items.push(MenuItem {
			text: "Delete node".into(),
			action: MenuAction::DeleteNode(DeleteMode::KeepChildren),
		});
		if expanded {
			items.push(MenuItem {
				text: "Delete node and expansion".into(),
				action: MenuAction::DeleteNode(DeleteMode::Cascade),
			});
		}

		self.menu = Some(ContextMenu {
			anchor: node.to_string(),
			x,
			y,
			items,
		});
		true
	}

	#[allow(missing_docs)]
	pub fn close_menu(&mut self) {
		self.menu = None;
	}

	/// Records `node` as the source of a new relation.
	pub fn start_relation(&mut self, node: &str) {
		self.menu = None;
		self.pending = None;
		self.draft_source = Some(node.to_string());
		debug!("relation: draft started from {}", node);
	}

	/// Picks the target of the current draft. Picking the source again cancels
	/// the draft. Returns the relation awaiting a label.
	pub fn confirm_target(&mut self, node: &str) -> Option<&PendingRelation> {
		self.menu = None;
		let source = self.draft_source.take()?;
		if source == node {
			debug!("relation: self relation on {} dropped", node);
			return None;
		}
		self.pending = Some(PendingRelation {
			source,
			target: node.to_string(),
		});
		self.pending.as_ref()
	}

	/// Creates the pending relation with `label`.
	///
	/// An empty label keeps the draft open and returns `Ok(None)`. Store
	/// rejections end the draft and are returned unchanged.
	pub fn submit_label(&mut self, store: &mut GraphStore, theme: &Theme, label: &str) -> Result<Option<String>> {
		let label = label.trim();
		if label.is_empty() {
			return Ok(None);
		}
		let Some(pending) = self.pending.take() else {
			return Ok(None);
		};

		let id = loop {
			self.next_id += 1;
			let id = format!("rel-{}", self.next_id);
			if !store.contains_edge(&id) {
				break id;
			}
		};
		let attrs = EdgeAttrs::new(label, theme.edge.relation_color, theme.edge.size);
		store.add_edge(id.clone(), &pending.source, &pending.target, attrs)?;
		info!("relation: {} {} -> {}", label, pending.source, pending.target);
		Ok(Some(id))
	}

	/// Removes `edge_id` and closes the menu.
	pub fn delete_relation(&mut self, store: &mut GraphStore, edge_id: &str) -> bool {
		self.menu = None;
		store.remove_edge(edge_id).is_some()
	}

	/// Drops the draft, the pending label and the menu.
	pub fn cancel(&mut self) {
		self.menu = None;
		self.draft_source = None;
		self.pending = None;
	}

	/// Same as [`RelationEditor::cancel`]; used on dataset switch.
	pub fn reset(&mut self) {
		self.cancel();
	}

	/// Clears everything that refers to a removed node.
	pub fn forget_node(&mut self, store: &GraphStore, node: &str) {
		if self.draft_source.as_deref() == Some(node) {
			self.draft_source = None;
		}
		if self
			.pending
			.as_ref()
			.is_some_and(|p| p.source == node || p.target == node)
		{
			self.pending = None;
		}
		let stale = self.menu.as_ref().is_some_and(|m| {
			m.anchor == node
				|| m.items.iter().any(|i| match &i.action {
					MenuAction::DeleteRelation(edge) => !store.contains_edge(edge),
					_ => false,
				})
		});
		if stale {
			self.menu = None;
		}
	}

}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::graph_view::error::GraphError;
	use crate::components::graph_view::store::NodeAttrs;
	use crate::components::graph_view::types::NodeKind;

	fn store() -> (GraphStore, Theme) {
		let theme = Theme::default();
		let mut store = GraphStore::new();
		for (id, label) in [("a", "Alice"), ("b", "Bob"), ("c", "Carol")] {
			let attrs = NodeAttrs::new(label, NodeKind::Person, theme.palette.person, 10.0);
			store.add_node(id, attrs).unwrap();
		}
		store
			.add_edge("ab", "a", "b", EdgeAttrs::new("knows", theme.edge.color, 1.0))
			.unwrap();
		(store, theme)
	}

	#[test]
	fn menu_lists_relations_with_display_names() {
		let (store, _) = store();
		let mut editor = RelationEditor::default();
		assert!(editor.open_menu(&store, "b", 10.0, 20.0, false));
		let menu = editor.menu().unwrap();
		assert_eq!(menu.relation_count(), 1);
		assert_eq!(menu.items[0].text, "Delete knows: Alice → Bob");
		assert_eq!(menu.items[0].action, MenuAction::DeleteRelation("ab".into()));
		assert!(menu.items.iter().any(|i| i.action == MenuAction::StartRelation));
		assert!(!editor.open_menu(&store, "zz", 0.0, 0.0, false));
		assert!(editor.menu().is_none());
	}

	#[test]
	fn draft_creates_labelled_relation() {
		let (mut store, theme) = store();
		let mut editor = RelationEditor::default();
		editor.start_relation("a");
		let pending = editor.confirm_target("c").cloned().unwrap();
		assert_eq!(pending, PendingRelation { source: "a".into(), target: "c".into() });

		assert_eq!(editor.submit_label(&mut store, &theme, "  ").unwrap(), None);
		assert!(editor.pending().is_some());

		let id = editor.submit_label(&mut store, &theme, "works with").unwrap().unwrap();
		let edge = store.edge(&id).unwrap();
		assert_eq!((edge.source.as_str(), edge.target.as_str()), ("a", "c"));
		assert_eq!(edge.label, "works with");
		assert_eq!(edge.color, theme.edge.relation_color);
		assert!(editor.pending().is_none());
	}

	#[test]
	fn self_relation_is_cancelled_silently() {
		let mut editor = RelationEditor::default();
		editor.start_relation("a");
		assert!(editor.confirm_target("a").is_none());
		assert!(editor.draft_source().is_none());
		assert!(editor.pending().is_none());
	}

	#[test]
	fn duplicate_relation_is_rejected_without_mutation() {
		let (mut store, theme) = store();
		let mut editor = RelationEditor::default();
		editor.start_relation("b");
		editor.confirm_target("a");
		let err = editor.submit_label(&mut store, &theme, "again").unwrap_err();
		assert!(matches!(err, GraphError::DuplicateEdge { .. }));
		assert_eq!(store.edge_count(), 1);
		assert!(editor.pending().is_none());
	}

	#[test]
	fn removed_nodes_clear_drafts_and_menus() {
		let (mut store, _) = store();
		let mut editor = RelationEditor::default();
		editor.open_menu(&store, "a", 0.0, 0.0, false);
		editor.start_relation("b");
		editor.open_menu(&store, "a", 0.0, 0.0, false);
		store.remove_node("b");
		editor.forget_node(&store, "b");
		assert!(editor.draft_source().is_none());
		assert!(editor.menu().is_none());
	}

	#[test]
	fn deleting_a_relation_closes_the_menu() {
		let (mut store, _) = store();
		let mut editor = RelationEditor::default();
		editor.open_menu(&store, "a", 0.0, 0.0, false);
		assert!(editor.delete_relation(&mut store, "ab"));
		assert!(editor.menu().is_none());
		assert_eq!(store.edge_count(), 0);
		assert!(!editor.delete_relation(&mut store, "ab"));
	}
}

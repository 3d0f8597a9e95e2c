//! Tearing down binding edges when subtrees leave the tree

use indexmap::IndexSet;
use tracing::debug;

use crate::error::Result;
use crate::forest::Forest;
use crate::tree::NodeId;
use crate::variable::{Role, VarId, VariableFilter};
use crate::workspace::WorkspaceId;

impl Forest {
    /// Sever every edge between a value owned inside `node`'s subtree and a
    /// reference also located inside it. Edges crossing the subtree boundary
    /// are left alone.
    ///
    /// Returns the number of severed edges.
    pub fn clear_cyclic_references(&mut self, node: NodeId) -> Result<usize> {
        self.node(node)?;
        let subtree: IndexSet<NodeId> = self.descendants(node).into_iter().collect();

        let mut internal = Vec::new();
        for id in &subtree {
            let Some(owner) = self.nodes.get(id) else {
                continue;
            };
            for (_, value) in owner.value_slots() {
                let Some(var) = self.variables.get(&value) else {
                    continue;
                };
                internal.extend(var.references().filter(|r| {
                    self.variables
                        .get(r)
                        .is_some_and(|rv| subtree.contains(&rv.source_node()))
                }));
            }
        }

        for &r in &internal {
            self.unlink(r)?;
        }
        debug!(root = %node, severed = internal.len(), "cleared cyclic references");
        self.check_after_mutation()?;
        Ok(internal.len())
    }

    /// Unplug `node` from its parent. References inside it that can no
    /// longer see their value are unbound and returned.
    pub fn disconnect(&mut self, node: NodeId) -> Result<Vec<VarId>> {
        if self.detach(node)?.is_none() {
            return Ok(Vec::new());
        }
        let stale = self.dangling_references(node)?;
        for &r in &stale {
            self.unlink(r)?;
        }
        debug!(node = %node, unbound = stale.len(), "disconnected");
        self.check_after_mutation()?;
        Ok(stale)
    }

    /// Remove `node` and everything under it from the forest, unregistering
    /// and destroying their variables.
    pub fn delete_subtree(&mut self, node: NodeId) -> Result<()> {
        self.clear_cyclic_references(node)?;
        self.detach(node)?;
        self.sever_boundary(node)?;

        let nodes = self.descendants(node);
        for &id in &nodes {
            self.unregister_node_variables(id)?;
        }
        self.destroy_nodes(&nodes)?;
        debug!(root = %node, nodes = nodes.len(), "deleted subtree");
        self.check_after_mutation()
    }

    /// Tear down a workspace, its child workspaces, and everything on them.
    pub fn dispose_workspace(&mut self, ws: WorkspaceId) -> Result<()> {
        let children = self.workspace(ws)?.children().to_vec();
        for child in children {
            self.dispose_workspace(child)?;
        }

        self.clear_workspace_db(ws)?;
        let roots = self.root_nodes(ws);
        let mut nodes = Vec::new();
        for &root in &roots {
            self.sever_boundary(root)?;
            nodes.extend(self.descendants(root));
        }
        for &id in &nodes {
            self.unregister_node_variables(id)?;
        }
        self.destroy_nodes(&nodes)?;

        if let Some(parent) = self.workspace(ws)?.parent() {
            self.workspace_mut(parent)?.children.retain(|c| *c != ws);
        }
        self.workspaces.shift_remove(&ws);
        debug!(workspace = %ws, nodes = nodes.len(), "disposed workspace");
        self.check_after_mutation()
    }

    /// Unbind every edge touching a variable under `node`.
    fn sever_boundary(&mut self, node: NodeId) -> Result<()> {
        let vars: Vec<VarId> = self
            .get_all_variables_in_subtree(node, VariableFilter::All)
            .collect();
        for var in vars {
            match self.role(var)? {
                Role::Reference => {
                    self.unlink(var)?;
                }
                Role::Value => {
                    self.unlink_value(var)?;
                }
            }
        }
        Ok(())
    }

    fn destroy_nodes(&mut self, nodes: &[NodeId]) -> Result<()> {
        for &id in nodes {
            let declared: Vec<VarId> = self
                .node(id)?
                .declared_variables()
                .map(|(_, var)| var)
                .collect();
            for var in declared {
                self.destroy_variable(var)?;
            }
            self.nodes.shift_remove(&id);
        }
        Ok(())
    }
}

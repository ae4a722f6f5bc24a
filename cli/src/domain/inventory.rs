//! Inventory tree and machine-name resolution.
//!
//! The platform's folder hierarchy is modelled as a plain two-case enum, so
//! resolution is a pure pre-order walk with no type inspection.

use serde::Serialize;

/// Reference to a platform-managed virtual machine.
///
/// `id` is the managed-object id (e.g. `vm-42`); it is only meaningful within
/// the session that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityHandle {
    pub id: String,
    pub name: String,
}

impl EntityHandle {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A node in a datacenter's VM folder tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerNode {
    Folder {
        name: String,
        children: Vec<ContainerNode>,
    },
    Machine(EntityHandle),
}

impl ContainerNode {
    pub fn folder(name: impl Into<String>, children: Vec<ContainerNode>) -> Self {
        Self::Folder {
            name: name.into(),
            children,
        }
    }

    pub fn machine(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Machine(EntityHandle::new(id, name))
    }

    /// Depth-first pre-order search for a machine named exactly `name`.
    ///
    /// Children are visited in the order the platform reported them and the
    /// first match wins. Uses an explicit stack, so deep trees cannot
    /// overflow the call stack.
    #[must_use]
    pub fn find_machine(&self, name: &str) -> Option<&EntityHandle> {
        let mut stack: Vec<&ContainerNode> = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                ContainerNode::Machine(handle) if handle.name == name => return Some(handle),
                ContainerNode::Machine(_) => {}
                ContainerNode::Folder { children, .. } => {
                    stack.extend(children.iter().rev());
                }
            }
        }
        None
    }

    /// Number of machines below (or at) this node.
    #[must_use]
    pub fn machine_count(&self) -> usize {
        match self {
            ContainerNode::Machine(_) => 1,
            ContainerNode::Folder { children, .. } => {
                children.iter().map(ContainerNode::machine_count).sum()
            }
        }
    }
}

/// A datacenter and the root of its VM folder tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datacenter {
    pub name: String,
    pub vm_folder: ContainerNode,
}

/// All datacenters under the platform root, in platform order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    pub datacenters: Vec<Datacenter>,
}

impl Inventory {
    #[must_use]
    pub fn new(datacenters: Vec<Datacenter>) -> Self {
        Self { datacenters }
    }

    /// Resolve a machine name across every datacenter.
    ///
    /// Datacenters are searched in order; the first datacenter containing a
    /// match wins, and within it the first match in pre-order wins.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&EntityHandle> {
        self.datacenters
            .iter()
            .find_map(|dc| dc.vm_folder.find_machine(name))
    }

    #[must_use]
    pub fn machine_count(&self) -> usize {
        self.datacenters
            .iter()
            .map(|dc| dc.vm_folder.machine_count())
            .sum()
    }
}

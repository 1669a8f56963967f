use super::element::Element;
use crate::core::maps::factory::transfer_map;
use crate::core::maps::transfer::{MapError, TransferMap};

/// One element of the sequence together with its built transfer map.
#[derive(Debug, Clone)]
pub struct LatticeNode {
    pub element: Element,
    pub map: TransferMap,
}

/// The ordered element sequence of a beamline or ring.
///
/// Transfer maps are built once at construction and are immutable
/// afterwards. The sequence is read-only during any traversal; changing an
/// element's strength goes through [`Lattice::replace_element`], which
/// rebuilds that element's map explicitly.
#[derive(Debug, Clone, Default)]
pub struct Lattice {
    nodes: Vec<LatticeNode>,
    total_len: f64,
}

impl Lattice {
    /// Builds the lattice, constructing one transfer map per element.
    pub fn new(elements: Vec<Element>) -> Result<Self, MapError> {
        let mut nodes = Vec::with_capacity(elements.len());
        let mut total_len = 0.0;
        for element in elements {
            let map = transfer_map(&element)?;
            total_len += element.length;
            nodes.push(LatticeNode { element, map });
        }
        Ok(Self { nodes, total_len })
    }

    pub fn sequence(&self) -> &[LatticeNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total physical length in meters.
    pub fn total_len(&self) -> f64 {
        self.total_len
    }

    pub fn element(&self, index: usize) -> Option<&Element> {
        self.nodes.get(index).map(|n| &n.element)
    }

    /// Replaces one element and rebuilds its transfer map.
    ///
    /// Dependent state held by callers (composed one-turn maps, traversal
    /// cursors) is not invalidated here; it must be rebuilt by the caller.
    pub fn replace_element(&mut self, index: usize, element: Element) -> Result<(), MapError> {
        let map = transfer_map(&element)?;
        let node = &mut self.nodes[index];
        self.total_len += element.length - node.element.length;
        *node = LatticeNode { element, map };
        Ok(())
    }

    /// Labels of all elements, in sequence order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.element.label.as_str())
    }
}

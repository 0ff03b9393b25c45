//! Netlist Arena
//!
//! The netlist owns every element and link of a circuit in two flat arenas.
//! Elements and links refer to each other only by index, so the cyclic
//! element/link graph needs no shared ownership, and cutting or restoring an
//! edge is an edit of two small index lists.

use super::element::{Element, ElementId, ElementKind};
use super::link::{Link, LinkId};
use crate::error::{CircuitError, Result};
use crate::logic::Logic;

/// Arena of elements and links.
#[derive(Debug, Default)]
pub struct Netlist {
    elements: Vec<Element>,
    links: Vec<Link>,

    /// Explicit inputs and clocks, in insertion order. These form level 0.
    roots: Vec<ElementId>,

    /// Clock elements, in insertion order.
    clocks: Vec<ElementId>,
}

impl Netlist {
    /// Create an empty netlist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an explicit input or clock.
    pub fn add_source(&mut self, name: impl Into<String>, kind: ElementKind, initial: bool) -> ElementId {
        let id = ElementId::new(self.elements.len());
        self.elements.push(Element::source(id, name.into(), kind, initial));
        self.roots.push(id);
        if matches!(kind, ElementKind::Clock { .. }) {
            self.clocks.push(id);
        }
        id
    }

    /// Add a combinational or sequential element.
    pub fn add_logic(
        &mut self,
        name: impl Into<String>,
        kind: ElementKind,
        logic: Box<dyn Logic>,
    ) -> ElementId {
        let id = ElementId::new(self.elements.len());
        self.elements.push(Element::with_logic(id, name.into(), kind, logic));
        id
    }

    /// Create a new output link on `source`.
    pub fn add_link(&mut self, source: ElementId) -> Result<LinkId> {
        let id = LinkId::new(self.links.len());
        self.element_mut(source)?.add_output(id);
        self.links.push(Link::new(id, source));
        Ok(id)
    }

    /// Append `destination` to the link and the link to the destination's inputs.
    pub fn attach(&mut self, link: LinkId, destination: ElementId) -> Result<()> {
        self.element(destination)?;
        self.link_mut(link)?.add_destination(destination);
        self.element_mut(destination)?.add_input(link);
        Ok(())
    }

    /// Feed `destination` from `source`, fanning out on the source's first
    /// output link (created on demand).
    pub fn connect(&mut self, source: ElementId, destination: ElementId) -> Result<LinkId> {
        let link = match self.element(source)?.outputs().first() {
            Some(link) => *link,
            None => self.add_link(source)?,
        };
        self.attach(link, destination)?;
        Ok(link)
    }

    /// Look up an element.
    pub fn element(&self, id: ElementId) -> Result<&Element> {
        self.elements
            .get(id.raw())
            .ok_or(CircuitError::UnknownElement(id))
    }

    /// Look up an element for modification.
    pub fn element_mut(&mut self, id: ElementId) -> Result<&mut Element> {
        self.elements
            .get_mut(id.raw())
            .ok_or(CircuitError::UnknownElement(id))
    }

    /// Look up a link.
    pub fn link(&self, id: LinkId) -> Result<&Link> {
        self.links.get(id.raw()).ok_or(CircuitError::UnknownLink(id))
    }

    /// Look up a link for modification.
    pub fn link_mut(&mut self, id: LinkId) -> Result<&mut Link> {
        self.links
            .get_mut(id.raw())
            .ok_or(CircuitError::UnknownLink(id))
    }

    /// All elements, indexed by `ElementId`.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// All links, indexed by `LinkId`.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Level-0 elements in insertion order.
    pub fn roots(&self) -> &[ElementId] {
        &self.roots
    }

    /// Clock elements, in insertion order.
    pub fn clocks(&self) -> &[ElementId] {
        &self.clocks
    }

    /// Total number of link-to-destination edges.
    pub fn edge_count(&self) -> usize {
        self.links.iter().map(|l| l.destinations().len()).sum()
    }

    /// Split borrow used by the evaluation loop.
    pub(crate) fn parts_mut(&mut self) -> (&mut [Element], &[Link]) {
        (&mut self.elements, &self.links)
    }

    pub(crate) fn reset_traversal(&mut self) {
        for element in &mut self.elements {
            element.reset_traversal();
        }
    }

    pub(crate) fn reset_validity(&mut self) {
        for link in &mut self.links {
            link.set_valid(false);
        }
    }

    /// Remove one edge: the destination at `slot` of `link`, together with the
    /// first matching entry in that destination's inputs.
    ///
    /// Returns the destination and the position it held in its inputs.
    pub(crate) fn remove_edge(&mut self, link: LinkId, slot: usize) -> Result<(ElementId, usize)> {
        let destination = self.link_mut(link)?.remove_destination(slot);
        let input_slot = self
            .element_mut(destination)?
            .remove_input(link)
            .ok_or(CircuitError::InputMismatch {
                link,
                element: destination,
            })?;
        Ok((destination, input_slot))
    }

    /// Reinstate an edge at the positions it was removed from.
    pub(crate) fn insert_edge(
        &mut self,
        link: LinkId,
        destination: ElementId,
        destination_slot: usize,
        input_slot: usize,
    ) -> Result<()> {
        self.link_mut(link)?
            .insert_destination(destination_slot, destination);
        self.element_mut(destination)?.insert_input(input_slot, link);
        Ok(())
    }

    /// Check the structural preconditions of the controller.
    ///
    /// - sources have no inputs
    /// - every link has at least one destination
    /// - each link lists an element exactly as often as that element lists
    ///   the link among its inputs
    pub fn validate(&self) -> Result<()> {
        for element in &self.elements {
            if element.is_source() && !element.inputs().is_empty() {
                return Err(CircuitError::SourceWithInputs {
                    element: element.id(),
                    name: element.name().to_string(),
                });
            }

            for &link_id in element.inputs() {
                let link = self.link(link_id)?;
                if !self.edge_counts_match(link, element) {
                    return Err(CircuitError::InputMismatch {
                        link: link_id,
                        element: element.id(),
                    });
                }
            }
        }

        for link in &self.links {
            if link.destinations().is_empty() {
                return Err(CircuitError::DanglingLink {
                    link: link.id(),
                    source_name: self.element(link.source())?.name().to_string(),
                });
            }

            for &destination in link.destinations() {
                let element = self.element(destination)?;
                if !self.edge_counts_match(link, element) {
                    return Err(CircuitError::InputMismatch {
                        link: link.id(),
                        element: destination,
                    });
                }
            }
        }

        Ok(())
    }

    fn edge_counts_match(&self, link: &Link, element: &Element) -> bool {
        let as_destination = link
            .destinations()
            .iter()
            .filter(|d| **d == element.id())
            .count();
        let as_input = element.inputs().iter().filter(|l| **l == link.id()).count();
        as_destination == as_input
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::Gate;

    fn gate(netlist: &mut Netlist, name: &str) -> ElementId {
        netlist.add_logic(name, ElementKind::Combinational, Box::new(Gate::And))
    }

    #[test]
    fn sources_become_roots() {
        let mut netlist = Netlist::new();
        let a = netlist.add_source("a", ElementKind::Explicit, false);
        let g = gate(&mut netlist, "g");
        let clk = netlist.add_source(
            "clk",
            ElementKind::Clock {
                period: std::time::Duration::from_millis(5),
            },
            false,
        );

        assert_eq!(netlist.roots(), &[a, clk]);
        assert_eq!(netlist.clocks(), &[clk]);
        assert!(!netlist.roots().contains(&g));
    }

    #[test]
    fn connect_fans_out_on_first_link() {
        let mut netlist = Netlist::new();
        let a = netlist.add_source("a", ElementKind::Explicit, false);
        let g1 = gate(&mut netlist, "g1");
        let g2 = gate(&mut netlist, "g2");

        let l1 = netlist.connect(a, g1).unwrap();
        let l2 = netlist.connect(a, g2).unwrap();

        assert_eq!(l1, l2);
        assert_eq!(netlist.link(l1).unwrap().destinations(), &[g1, g2]);
        assert_eq!(netlist.element(g2).unwrap().inputs(), &[l1]);
        assert_eq!(netlist.edge_count(), 2);
    }

    #[test]
    fn remove_and_insert_edge_round_trip() {
        let mut netlist = Netlist::new();
        let a = netlist.add_source("a", ElementKind::Explicit, false);
        let b = netlist.add_source("b", ElementKind::Explicit, false);
        let g1 = gate(&mut netlist, "g1");
        let g2 = gate(&mut netlist, "g2");
        let la = netlist.connect(a, g1).unwrap();
        netlist.connect(a, g2).unwrap();
        let lb = netlist.connect(b, g1).unwrap();
        assert_eq!(netlist.element(g1).unwrap().inputs(), &[la, lb]);

        let (destination, input_slot) = netlist.remove_edge(la, 0).unwrap();
        assert_eq!(destination, g1);
        assert_eq!(input_slot, 0);
        assert_eq!(netlist.link(la).unwrap().destinations(), &[g2]);
        assert_eq!(netlist.element(g1).unwrap().inputs(), &[lb]);

        netlist.insert_edge(la, g1, 0, input_slot).unwrap();
        assert_eq!(netlist.link(la).unwrap().destinations(), &[g1, g2]);
        assert_eq!(netlist.element(g1).unwrap().inputs(), &[la, lb]);
    }

    #[test]
    fn unknown_handles_are_rejected() {
        let mut netlist = Netlist::new();
        let a = netlist.add_source("a", ElementKind::Explicit, false);
        let bogus = ElementId::new(42);

        assert!(matches!(
            netlist.connect(a, bogus),
            Err(CircuitError::UnknownElement(id)) if id == bogus
        ));
        assert!(matches!(
            netlist.attach(LinkId::new(7), a),
            Err(CircuitError::UnknownLink(_))
        ));
    }

    #[test]
    fn validate_rejects_dangling_link() {
        let mut netlist = Netlist::new();
        let a = netlist.add_source("a", ElementKind::Explicit, false);
        netlist.add_link(a).unwrap();

        assert!(matches!(
            netlist.validate(),
            Err(CircuitError::DanglingLink { ref source_name, .. }) if source_name == "a"
        ));
    }

    #[test]
    fn validate_rejects_driven_source() {
        let mut netlist = Netlist::new();
        let a = netlist.add_source("a", ElementKind::Explicit, false);
        let b = netlist.add_source("b", ElementKind::Explicit, false);
        netlist.connect(a, b).unwrap();

        assert!(matches!(
            netlist.validate(),
            Err(CircuitError::SourceWithInputs { element, .. }) if element == b
        ));
    }

    #[test]
    fn validate_rejects_mismatched_edge() {
        let mut netlist = Netlist::new();
        let a = netlist.add_source("a", ElementKind::Explicit, false);
        let g = gate(&mut netlist, "g");
        let link = netlist.connect(a, g).unwrap();
        netlist.element_mut(g).unwrap().add_input(link);

        assert!(matches!(
            netlist.validate(),
            Err(CircuitError::InputMismatch { element, .. }) if element == g
        ));
    }

    #[test]
    fn validate_accepts_well_formed_graph() {
        let mut netlist = Netlist::new();
        let a = netlist.add_source("a", ElementKind::Explicit, false);
        let g = gate(&mut netlist, "g");
        netlist.connect(a, g).unwrap();
        netlist.connect(a, g).unwrap();
        netlist.connect(g, g).unwrap();

        assert!(netlist.validate().is_ok());
    }
}

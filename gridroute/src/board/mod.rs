//! In-memory board model.
//!
//! Copper primitives carry opaque ids assigned once when they enter the
//! board. Every edit (removal, endpoint replacement) references such an id
//! directly, so edits can never silently miss their target the way
//! formatted-coordinate matching can.

pub mod connect;
pub mod io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::Point;

/// Index into the board's ordered layer table.
pub type LayerId = u8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NetId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ViaId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PadId(pub u32);

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("no segment with id {0:?}")]
    UnknownSegment(SegmentId),
    #[error("no net named {0}")]
    UnknownNet(String),
    #[error("no layer named {0}")]
    UnknownLayer(String),
}

/// A net: the set of copper that must end up electrically connected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Net {
    pub id: NetId,
    pub name: String,
}

/// One straight copper trace on one layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentId,
    pub net: NetId,
    pub layer: LayerId,
    pub start: Point,
    pub end: Point,
    pub width: f64,
}

/// A drilled, plated hole connecting the listed layers.
///
/// A via occupies its (x, y) footprint on every board layer for routing
/// purposes, but only the layers in `layers` are treated as electrically
/// connected by it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Via {
    pub id: ViaId,
    pub net: NetId,
    pub at: Point,
    pub diameter: f64,
    pub drill: f64,
    pub layers: Vec<LayerId>,
}

/// A component pad.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pad {
    pub id: PadId,
    pub net: NetId,
    pub at: Point,
    /// Copper footprint (width, height), mm.
    pub size: (f64, f64),
    pub layers: Vec<LayerId>,
    pub net_name: Option<String>,
}

/// The full board geometry the router reads and edits.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Board {
    /// Ordered layer names; everything else refers to layers by index.
    pub layers: Vec<String>,
    nets: Vec<Net>,
    segments: Vec<Segment>,
    vias: Vec<Via>,
    pads: Vec<Pad>,
    #[serde(skip)]
    next_segment: u32,
    #[serde(skip)]
    next_via: u32,
    #[serde(skip)]
    next_pad: u32,
}

impl Board {
    pub fn new(layers: Vec<String>) -> Self {
        Self {
            layers,
            ..Self::default()
        }
    }

    /// Index of a layer by name.
    pub fn layer_index(&self, name: &str) -> Option<LayerId> {
        self.layers
            .iter()
            .position(|l| l == name)
            .map(|i| i as LayerId)
    }

    pub fn nets(&self) -> &[Net] {
        &self.nets
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn vias(&self) -> &[Via] {
        &self.vias
    }

    pub fn pads(&self) -> &[Pad] {
        &self.pads
    }

    pub fn net_by_name(&self, name: &str) -> Option<&Net> {
        self.nets.iter().find(|n| n.name == name)
    }

    pub fn net_name(&self, net: NetId) -> Option<&str> {
        self.nets
            .iter()
            .find(|n| n.id == net)
            .map(|n| n.name.as_str())
    }

    /// Register a net, returning its id. An existing net with the same
    /// name is reused.
    pub fn add_net(&mut self, name: &str) -> NetId {
        if let Some(net) = self.net_by_name(name) {
            return net.id;
        }
        let id = NetId(self.nets.iter().map(|n| n.id.0 + 1).max().unwrap_or(1));
        self.nets.push(Net {
            id,
            name: name.to_string(),
        });
        id
    }

    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == id)
    }

    pub fn via(&self, id: ViaId) -> Option<&Via> {
        self.vias.iter().find(|v| v.id == id)
    }

    pub fn pad(&self, id: PadId) -> Option<&Pad> {
        self.pads.iter().find(|p| p.id == id)
    }

    pub fn add_segment(
        &mut self,
        net: NetId,
        layer: LayerId,
        start: Point,
        end: Point,
        width: f64,
    ) -> SegmentId {
        let id = SegmentId(self.next_segment);
        self.next_segment += 1;
        self.segments.push(Segment {
            id,
            net,
            layer,
            start,
            end,
            width,
        });
        id
    }

    pub fn add_via(
        &mut self,
        net: NetId,
        at: Point,
        diameter: f64,
        drill: f64,
        layers: Vec<LayerId>,
    ) -> ViaId {
        let id = ViaId(self.next_via);
        self.next_via += 1;
        self.vias.push(Via {
            id,
            net,
            at,
            diameter,
            drill,
            layers,
        });
        id
    }

    pub fn add_pad(
        &mut self,
        net: NetId,
        at: Point,
        size: (f64, f64),
        layers: Vec<LayerId>,
        net_name: Option<String>,
    ) -> PadId {
        let id = PadId(self.next_pad);
        self.next_pad += 1;
        self.pads.push(Pad {
            id,
            net,
            at,
            size,
            layers,
            net_name,
        });
        id
    }

    /// Remove a segment by id.
    pub fn remove_segment(&mut self, id: SegmentId) -> Result<Segment, BoardError> {
        let idx = self
            .segments
            .iter()
            .position(|s| s.id == id)
            .ok_or(BoardError::UnknownSegment(id))?;
        Ok(self.segments.remove(idx))
    }

    /// Replace a segment's endpoints, keeping its id, net, layer and width.
    pub fn replace_segment_endpoints(
        &mut self,
        id: SegmentId,
        start: Point,
        end: Point,
    ) -> Result<(), BoardError> {
        let seg = self
            .segments
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(BoardError::UnknownSegment(id))?;
        seg.start = start;
        seg.end = end;
        Ok(())
    }

    /// Recompute the id counters from existing geometry. Called after
    /// deserialization, where the counters are not part of the document.
    pub(crate) fn refresh_id_counters(&mut self) {
        self.next_segment = self.segments.iter().map(|s| s.id.0 + 1).max().unwrap_or(0);
        self.next_via = self.vias.iter().map(|v| v.id.0 + 1).max().unwrap_or(0);
        self.next_pad = self.pads.iter().map(|p| p.id.0 + 1).max().unwrap_or(0);
    }
}

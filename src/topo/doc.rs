use std::collections::BTreeMap;

use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Linear transform for quantized arcs: position = value * scale + translate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transform {
    pub scale: [f64; 2],
    pub translate: [f64; 2],
}

/// A topology document: shared arc segments plus named geometry collections
/// built from them. When `transform` is present the arcs are delta-encoded
/// on the quantized grid; otherwise they hold absolute positions.
#[derive(Debug, Serialize, Deserialize)]
pub struct Topology {
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<[f64; 4]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
    pub objects: BTreeMap<String, TopoObject>,
    #[serde(serialize_with = "serialize_arcs")]
    pub arcs: Vec<Vec<[f64; 2]>>,
}

/// One named layer of the document.
#[derive(Debug, Serialize, Deserialize)]
pub struct TopoObject {
    #[serde(rename = "type")]
    pub ty: String,
    pub geometries: Vec<TopoGeometry>,
}

/// One geometry in a layer. `arcs` holds ring arc-index lists whose nesting
/// depends on `ty`; `ty` stays optional so a degenerate merge (a geometry
/// that lost its shape) is representable and checkable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopoGeometry {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arcs: Option<Value>,
}

/// Quantized deltas are whole numbers; write them as JSON integers rather
/// than `1234.0`.
fn serialize_arcs<S: Serializer>(arcs: &[Vec<[f64; 2]>], serializer: S) -> Result<S::Ok, S::Error> {
    struct Num(f64);
    impl Serialize for Num {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            if self.0.fract() == 0.0 && self.0.abs() < 9.0e15 {
                serializer.serialize_i64(self.0 as i64)
            } else {
                serializer.serialize_f64(self.0)
            }
        }
    }

    struct Point<'a>(&'a [f64; 2]);
    impl Serialize for Point<'_> {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut seq = serializer.serialize_seq(Some(2))?;
            seq.serialize_element(&Num(self.0[0]))?;
            seq.serialize_element(&Num(self.0[1]))?;
            seq.end()
        }
    }

    struct Arc<'a>(&'a [[f64; 2]]);
    impl Serialize for Arc<'_> {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
            for point in self.0 {
                seq.serialize_element(&Point(point))?;
            }
            seq.end()
        }
    }

    let mut seq = serializer.serialize_seq(Some(arcs.len()))?;
    for arc in arcs {
        seq.serialize_element(&Arc(arc))?;
    }
    seq.end()
}

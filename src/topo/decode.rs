use anyhow::{Context, Result, anyhow, bail, ensure};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::Value;

use super::doc::{TopoGeometry, Topology};
use crate::geom::Feature;

/// Expand a topology's shared arcs into discrete per-feature polygons for
/// one named object layer.
pub fn featurize(topology: &Topology, object: &str) -> Result<Vec<Feature>> {
    let layer = topology
        .objects
        .get(object)
        .ok_or_else(|| anyhow!("[topo::decode] topology has no {object:?} object"))?;
    let arcs = absolute_arcs(topology);

    layer
        .geometries
        .iter()
        .enumerate()
        .map(|(i, geometry)| {
            decode_geometry(geometry, &arcs)
                .with_context(|| format!("[topo::decode] geometry {i} of {object:?}"))
        })
        .collect()
}

/// Undo delta encoding and the quantization transform, yielding arcs in
/// absolute coordinates.
fn absolute_arcs(topology: &Topology) -> Vec<Vec<Coord<f64>>> {
    topology
        .arcs
        .iter()
        .map(|arc| match &topology.transform {
            Some(transform) => {
                let mut x = 0.0;
                let mut y = 0.0;
                arc.iter()
                    .map(|[dx, dy]| {
                        x += dx;
                        y += dy;
                        Coord {
                            x: x * transform.scale[0] + transform.translate[0],
                            y: y * transform.scale[1] + transform.translate[1],
                        }
                    })
                    .collect()
            }
            None => arc.iter().map(|[x, y]| Coord { x: *x, y: *y }).collect(),
        })
        .collect()
}

fn decode_geometry(geometry: &TopoGeometry, arcs: &[Vec<Coord<f64>>]) -> Result<Feature> {
    let ty = geometry.ty.as_deref().ok_or_else(|| anyhow!("geometry has no type"))?;
    let arc_refs = geometry.arcs.as_ref().ok_or_else(|| anyhow!("geometry has no arcs"))?;

    let decoded = match ty {
        "Polygon" => MultiPolygon(vec![decode_polygon(arc_refs, arcs)?]),
        "MultiPolygon" => MultiPolygon(
            arc_refs
                .as_array()
                .ok_or_else(|| anyhow!("MultiPolygon arcs must be an array"))?
                .iter()
                .map(|polygon| decode_polygon(polygon, arcs))
                .collect::<Result<Vec<_>>>()?,
        ),
        other => bail!("unsupported geometry type {other:?}"),
    };

    Ok(Feature {
        id: geometry.id.as_ref().map(id_text),
        properties: geometry.properties.clone().unwrap_or_default(),
        geometry: decoded,
    })
}

/// Ids appear both as strings and as bare numbers in the wild.
fn id_text(id: &Value) -> String {
    match id {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn decode_polygon(rings: &Value, arcs: &[Vec<Coord<f64>>]) -> Result<Polygon<f64>> {
    let rings = rings.as_array().ok_or_else(|| anyhow!("polygon arcs must be an array"))?;
    ensure!(!rings.is_empty(), "polygon has no rings");
    let mut decoded = rings
        .iter()
        .map(|ring| decode_ring(ring, arcs))
        .collect::<Result<Vec<_>>>()?;
    let exterior = decoded.remove(0);
    Ok(Polygon::new(exterior, decoded))
}

/// Stitch a ring together from arc references. A negative reference `~i`
/// walks arc `i` backwards. Consecutive arcs share their join point, which
/// is emitted once.
fn decode_ring(ring: &Value, arcs: &[Vec<Coord<f64>>]) -> Result<LineString<f64>> {
    let refs = ring.as_array().ok_or_else(|| anyhow!("ring must be an array of arc indices"))?;
    let mut points: Vec<Coord<f64>> = Vec::new();
    for arc_ref in refs {
        let arc_ref = arc_ref.as_i64().ok_or_else(|| anyhow!("arc index must be an integer"))?;
        let (index, reversed) = if arc_ref < 0 { (!arc_ref as usize, true) } else { (arc_ref as usize, false) };
        let arc = arcs.get(index).ok_or_else(|| anyhow!("arc index {index} out of range"))?;

        let skip = usize::from(!points.is_empty());
        if reversed {
            points.extend(arc.iter().rev().skip(skip).copied());
        } else {
            points.extend(arc.iter().skip(skip).copied());
        }
    }
    if !points.is_empty() && points.first() != points.last() {
        points.push(points[0]);
    }
    Ok(LineString(points))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use geo::Area;
    use serde_json::json;

    use super::featurize;
    use crate::topo::{TopoGeometry, TopoObject, Topology, Transform};

    fn geometry(ty: &str, id: serde_json::Value, arcs: serde_json::Value) -> TopoGeometry {
        let mut properties = serde_json::Map::new();
        properties.insert("state".into(), json!("CA"));
        TopoGeometry { ty: Some(ty.into()), id: Some(id), properties: Some(properties), arcs: Some(arcs) }
    }

    fn document(geometries: Vec<TopoGeometry>, transform: Option<Transform>, arcs: Vec<Vec<[f64; 2]>>) -> Topology {
        let mut objects = BTreeMap::new();
        objects.insert("counties".into(), TopoObject { ty: "GeometryCollection".into(), geometries });
        Topology { ty: "Topology".into(), bbox: None, transform, objects, arcs }
    }

    #[test]
    fn decodes_absolute_arcs() {
        // unit square as a single closed arc
        let topology = document(
            vec![geometry("Polygon", json!("06001"), json!([[0]]))],
            None,
            vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]],
        );

        let features = featurize(&topology, "counties").unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].id.as_deref(), Some("06001"));
        assert_eq!(features[0].properties["state"], json!("CA"));
        assert!((features[0].geometry.unsigned_area() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn decodes_quantized_deltas() {
        // the same unit square on a 0.001 grid, delta-encoded
        let topology = document(
            vec![geometry("Polygon", json!(6001), json!([[0]]))],
            Some(Transform { scale: [0.001, 0.001], translate: [10.0, 20.0] }),
            vec![vec![[0.0, 0.0], [1000.0, 0.0], [0.0, 1000.0], [-1000.0, 0.0], [0.0, -1000.0]]],
        );

        let features = featurize(&topology, "counties").unwrap();
        let ring = &features[0].geometry.0[0].exterior().0;
        assert_eq!(ring[0], geo::Coord { x: 10.0, y: 20.0 });
        assert_eq!(ring[1], geo::Coord { x: 11.0, y: 20.0 });
        assert_eq!(ring[2], geo::Coord { x: 11.0, y: 21.0 });
        assert_eq!(features[0].id.as_deref(), Some("6001"));
    }

    #[test]
    fn stitches_shared_and_reversed_arcs() {
        // two arcs forming a square: the left half forward, the right half
        // referenced backwards
        let topology = document(
            vec![geometry("Polygon", json!("06001"), json!([[0, -2]]))],
            None,
            vec![
                vec![[1.0, 1.0], [0.0, 1.0], [0.0, 0.0], [1.0, 0.0]],
                vec![[1.0, 1.0], [1.0, 0.0]],
            ],
        );

        let features = featurize(&topology, "counties").unwrap();
        let ring = &features[0].geometry.0[0].exterior().0;
        assert_eq!(ring.first(), ring.last());
        assert!((features[0].geometry.unsigned_area() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn multipolygon_keeps_every_part() {
        let topology = document(
            vec![geometry("MultiPolygon", json!("06001"), json!([[[0]], [[1]]]))],
            None,
            vec![
                vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]],
                vec![[5.0, 0.0], [6.0, 0.0], [6.0, 1.0], [5.0, 1.0], [5.0, 0.0]],
            ],
        );

        let features = featurize(&topology, "counties").unwrap();
        assert_eq!(features[0].geometry.0.len(), 2);
    }

    #[test]
    fn unknown_layer_is_an_error() {
        let topology = document(vec![], None, vec![]);
        assert!(featurize(&topology, "tracts").is_err());
    }
}

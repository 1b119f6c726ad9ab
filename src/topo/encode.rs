use std::collections::BTreeMap;

use ahash::AHashMap;
use anyhow::Result;
use geo::LineString;
use serde_json::{Value, json};

use super::doc::{TopoGeometry, TopoObject, Topology, Transform};
use crate::geom::Feature;

/// Encoder settings. `quantization` is the number of addressable grid
/// positions per axis; 10,000 is the conventional default.
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    pub quantization: u32,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self { quantization: 10_000 }
    }
}

type QPoint = (i64, i64);

/// Build a topology document from named feature layers.
///
/// Coordinates are quantized onto a shared grid, boundaries shared between
/// features (within or across layers) are stored as one arc, and every
/// feature keeps its id and all of its properties.
pub fn encode(layers: &[(&str, &[Feature])], options: &EncodeOptions) -> Result<Topology> {
    let bbox = bounding_box(layers);
    let transform = grid_transform(&bbox, options.quantization);

    // quantize every ring, remembering which feature and polygon owns it
    let mut rings: Vec<Vec<QPoint>> = Vec::new();
    // layer -> feature -> polygon -> ring ids, exterior ring first
    let mut skeletons: Vec<Vec<Vec<Vec<usize>>>> = Vec::new();
    for (_, features) in layers {
        let mut feature_skeletons = Vec::with_capacity(features.len());
        for feature in *features {
            let mut polygons = Vec::with_capacity(feature.geometry.0.len());
            for polygon in &feature.geometry.0 {
                let mut ring_ids = Vec::with_capacity(1 + polygon.interiors().len());
                for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
                    rings.push(quantize_ring(ring, &transform));
                    ring_ids.push(rings.len() - 1);
                }
                polygons.push(ring_ids);
            }
            feature_skeletons.push(polygons);
        }
        skeletons.push(feature_skeletons);
    }

    let junctions = find_junctions(&rings);

    // cut each ring at its junctions and intern the pieces as shared arcs
    let mut arcs = ArcStore::default();
    let ring_refs: Vec<Vec<i64>> =
        rings.iter().map(|ring| cut_ring(ring, &junctions, &mut arcs)).collect();

    let mut objects = BTreeMap::new();
    for ((name, features), feature_skeletons) in layers.iter().zip(&skeletons) {
        let geometries = features
            .iter()
            .zip(feature_skeletons)
            .map(|(feature, polygons)| geometry_of(feature, polygons, &ring_refs))
            .collect();
        objects.insert(
            (*name).to_string(),
            TopoObject { ty: "GeometryCollection".into(), geometries },
        );
    }

    Ok(Topology {
        ty: "Topology".into(),
        bbox: Some(bbox),
        transform: Some(transform),
        objects,
        arcs: arcs.delta_encoded(),
    })
}

fn bounding_box(layers: &[(&str, &[Feature])]) -> [f64; 4] {
    let mut bbox = [f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY];
    for (_, features) in layers {
        for feature in *features {
            for polygon in &feature.geometry.0 {
                for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
                    for coord in &ring.0 {
                        bbox[0] = bbox[0].min(coord.x);
                        bbox[1] = bbox[1].min(coord.y);
                        bbox[2] = bbox[2].max(coord.x);
                        bbox[3] = bbox[3].max(coord.y);
                    }
                }
            }
        }
    }
    if bbox[0] > bbox[2] { [0.0, 0.0, 0.0, 0.0] } else { bbox }
}

fn grid_transform(bbox: &[f64; 4], quantization: u32) -> Transform {
    let divisions = (quantization.max(2) - 1) as f64;
    let scale_x = if bbox[2] > bbox[0] { (bbox[2] - bbox[0]) / divisions } else { 1.0 };
    let scale_y = if bbox[3] > bbox[1] { (bbox[3] - bbox[1]) / divisions } else { 1.0 };
    Transform { scale: [scale_x, scale_y], translate: [bbox[0], bbox[1]] }
}

/// Snap a ring onto the grid, dropping points that quantization collapsed.
/// The ring is stored open; cutting treats it as cyclic.
fn quantize_ring(ring: &LineString<f64>, transform: &Transform) -> Vec<QPoint> {
    let mut out: Vec<QPoint> = Vec::with_capacity(ring.0.len());
    for coord in &ring.0 {
        let point = (
            ((coord.x - transform.translate[0]) / transform.scale[0]).round() as i64,
            ((coord.y - transform.translate[1]) / transform.scale[1]).round() as i64,
        );
        if out.last() != Some(&point) {
            out.push(point);
        }
    }
    if out.len() > 1 && out.first() == out.last() {
        out.pop();
    }
    out
}

struct Visit {
    neighbors: (QPoint, QPoint),
    junction: bool,
}

/// A grid point is a junction when two traversals pass through it with
/// different neighbors; interior points of a boundary shared by exactly two
/// rings are not junctions, so shared polylines stay whole.
fn find_junctions(rings: &[Vec<QPoint>]) -> AHashMap<QPoint, Visit> {
    let mut visits: AHashMap<QPoint, Visit> = AHashMap::new();
    for ring in rings {
        let n = ring.len();
        for i in 0..n {
            let neighbors = unordered(ring[(i + n - 1) % n], ring[(i + 1) % n]);
            visits
                .entry(ring[i])
                .and_modify(|visit| {
                    if visit.neighbors != neighbors {
                        visit.junction = true;
                    }
                })
                .or_insert(Visit { neighbors, junction: false });
        }
    }
    visits
}

fn unordered(a: QPoint, b: QPoint) -> (QPoint, QPoint) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Cut one cyclic ring into arc references. A ring without junctions
/// becomes a single closed arc; otherwise each piece runs from one junction
/// to the next, both endpoints included.
fn cut_ring(ring: &[QPoint], junctions: &AHashMap<QPoint, Visit>, arcs: &mut ArcStore) -> Vec<i64> {
    if ring.is_empty() {
        return Vec::new();
    }
    let n = ring.len();
    let cuts: Vec<usize> =
        (0..n).filter(|&i| junctions.get(&ring[i]).is_some_and(|v| v.junction)).collect();

    if cuts.is_empty() {
        return vec![arcs.intern_ring(ring)];
    }

    let mut refs = Vec::with_capacity(cuts.len());
    for (k, &start) in cuts.iter().enumerate() {
        let end = cuts[(k + 1) % cuts.len()];
        let mut segment = vec![ring[start]];
        let mut i = (start + 1) % n;
        loop {
            segment.push(ring[i]);
            if i == end {
                break;
            }
            i = (i + 1) % n;
        }
        refs.push(arcs.intern_open(segment));
    }
    refs
}

#[derive(Default)]
struct ArcStore {
    arcs: Vec<Vec<QPoint>>,
    index: AHashMap<Vec<QPoint>, usize>,
}

impl ArcStore {
    /// Intern an arc that starts and ends on junctions. A boundary walked
    /// in the opposite direction by its other owner collapses onto the same
    /// stored arc, referenced reversed (`~index`).
    fn intern_open(&mut self, segment: Vec<QPoint>) -> i64 {
        let reversed: Vec<QPoint> = segment.iter().rev().copied().collect();
        let key = if reversed < segment { reversed } else { segment.clone() };
        if let Some(&idx) = self.index.get(&key) {
            if self.arcs[idx] == segment { idx as i64 } else { !(idx as i64) }
        } else {
            let idx = self.arcs.len();
            self.index.insert(key, idx);
            self.arcs.push(segment);
            idx as i64
        }
    }

    /// Intern a whole-ring arc. The cycle is rotated to a canonical start,
    /// so identical rings traced from different points or in opposite
    /// directions still share one arc.
    fn intern_ring(&mut self, cycle: &[QPoint]) -> i64 {
        let canonical = canonical_cycle(cycle);
        if let Some(&idx) = self.index.get(&canonical) {
            idx as i64
        } else {
            let idx = self.arcs.len();
            self.index.insert(canonical.clone(), idx);
            self.arcs.push(canonical);
            idx as i64
        }
    }

    /// First point absolute, every following point a delta from the last.
    fn delta_encoded(&self) -> Vec<Vec<[f64; 2]>> {
        self.arcs
            .iter()
            .map(|arc| {
                let mut last = (0i64, 0i64);
                arc.iter()
                    .map(|&(x, y)| {
                        let delta = [(x - last.0) as f64, (y - last.1) as f64];
                        last = (x, y);
                        delta
                    })
                    .collect()
            })
            .collect()
    }
}

fn canonical_cycle(cycle: &[QPoint]) -> Vec<QPoint> {
    let forward = rotate_to_min(cycle);
    let reversed: Vec<QPoint> = cycle.iter().rev().copied().collect();
    let backward = rotate_to_min(&reversed);
    let mut best = if backward < forward { backward } else { forward };
    if let Some(&first) = best.first() {
        best.push(first); // arcs carry their closing point explicitly
    }
    best
}

fn rotate_to_min(cycle: &[QPoint]) -> Vec<QPoint> {
    match (0..cycle.len()).min_by_key(|&i| cycle[i]) {
        Some(min_at) => cycle[min_at..].iter().chain(&cycle[..min_at]).copied().collect(),
        None => Vec::new(),
    }
}

/// One geometry entry: `Polygon` for single-polygon features, otherwise
/// `MultiPolygon`. An empty geometry gets no type at all, which the
/// pipeline's sanity check looks for.
fn geometry_of(feature: &Feature, polygons: &[Vec<usize>], ring_refs: &[Vec<i64>]) -> TopoGeometry {
    let id = feature.id.clone().map(Value::String);
    let properties = Some(feature.properties.clone());

    let rings_of =
        |polygon: &Vec<usize>| -> Vec<Vec<i64>> { polygon.iter().map(|&r| ring_refs[r].clone()).collect() };

    match polygons.len() {
        0 => TopoGeometry { ty: None, id, properties, arcs: None },
        1 => TopoGeometry {
            ty: Some("Polygon".into()),
            id,
            properties,
            arcs: Some(json!(rings_of(&polygons[0]))),
        },
        _ => TopoGeometry {
            ty: Some("MultiPolygon".into()),
            id,
            properties,
            arcs: Some(json!(polygons.iter().map(rings_of).collect::<Vec<_>>())),
        },
    }
}

#[cfg(test)]
mod tests {
    use geo::{Area, Coord, LineString, MultiPolygon, Polygon};
    use serde_json::{Value, json};

    use super::{EncodeOptions, encode};
    use crate::geom::Feature;
    use crate::topo::featurize;

    fn square(x: f64, y: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![Polygon::new(
            LineString(vec![
                Coord { x, y },
                Coord { x: x + 1.0, y },
                Coord { x: x + 1.0, y: y + 1.0 },
                Coord { x, y: y + 1.0 },
                Coord { x, y },
            ]),
            vec![],
        )])
    }

    fn feature(id: &str, state: &str, geometry: MultiPolygon<f64>) -> Feature {
        let mut properties = serde_json::Map::new();
        properties.insert("state".into(), json!(state));
        properties.insert("FIPS".into(), json!(id));
        Feature { id: Some(id.into()), properties, geometry }
    }

    fn arc_refs(geometry: &crate::topo::TopoGeometry) -> Vec<i64> {
        fn collect(value: &Value, out: &mut Vec<i64>) {
            match value {
                Value::Array(items) => items.iter().for_each(|v| collect(v, out)),
                Value::Number(n) => out.push(n.as_i64().unwrap()),
                _ => {}
            }
        }
        let mut out = Vec::new();
        collect(geometry.arcs.as_ref().unwrap(), &mut out);
        out
    }

    #[test]
    fn adjacent_features_share_their_boundary_arc() {
        let counties = vec![
            feature("06001", "CA", square(0.0, 0.0)),
            feature("06003", "CA", square(1.0, 0.0)),
        ];
        let topology =
            encode(&[("counties", counties.as_slice())], &EncodeOptions::default()).unwrap();

        // shared edge, left remainder, right remainder
        assert_eq!(topology.arcs.len(), 3);

        let geometries = &topology.objects["counties"].geometries;
        let all_refs: Vec<i64> =
            geometries.iter().flat_map(|g| arc_refs(g)).collect();
        assert!(
            all_refs.iter().any(|&r| r < 0),
            "one owner should reference the shared arc reversed: {all_refs:?}"
        );
    }

    #[test]
    fn lone_ring_becomes_one_closed_arc() {
        let counties = vec![feature("15001", "HI", square(0.0, 0.0))];
        let topology =
            encode(&[("counties", counties.as_slice())], &EncodeOptions::default()).unwrap();
        assert_eq!(topology.arcs.len(), 1);
        assert_eq!(topology.arcs[0].len(), 5);
    }

    #[test]
    fn identical_rings_across_layers_share_one_arc() {
        // a single-county state: the state boundary is the county boundary
        let counties = vec![feature("11001", "DC", square(0.0, 0.0))];
        let states = vec![feature("DC", "DC", square(0.0, 0.0))];
        let topology = encode(
            &[("counties", counties.as_slice()), ("states", states.as_slice())],
            &EncodeOptions::default(),
        )
        .unwrap();
        assert_eq!(topology.arcs.len(), 1);
    }

    #[test]
    fn round_trip_preserves_shape_ids_and_properties() {
        let counties = vec![
            feature("06001", "CA", square(0.0, 0.0)),
            feature("06003", "CA", square(1.0, 0.0)),
        ];
        let topology =
            encode(&[("counties", counties.as_slice())], &EncodeOptions::default()).unwrap();
        let decoded = featurize(&topology, "counties").unwrap();

        assert_eq!(decoded.len(), 2);
        for (before, after) in counties.iter().zip(&decoded) {
            assert_eq!(before.id, after.id);
            assert_eq!(before.properties, after.properties);
            let err = (before.geometry.unsigned_area() - after.geometry.unsigned_area()).abs();
            assert!(err < 1e-2, "area drifted by {err}");
        }
    }

    #[test]
    fn encoding_is_deterministic() {
        let counties = vec![
            feature("06001", "CA", square(0.0, 0.0)),
            feature("06003", "CA", square(1.0, 0.0)),
        ];
        let layers = [("counties", counties.as_slice())];
        let first = serde_json::to_string(&encode(&layers, &EncodeOptions::default()).unwrap()).unwrap();
        let second = serde_json::to_string(&encode(&layers, &EncodeOptions::default()).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_geometry_has_no_type() {
        let counties = vec![feature("06001", "CA", MultiPolygon(vec![]))];
        let topology =
            encode(&[("counties", counties.as_slice())], &EncodeOptions::default()).unwrap();
        let geometry = &topology.objects["counties"].geometries[0];
        assert!(geometry.ty.is_none());
        assert!(geometry.arcs.is_none());
    }
}

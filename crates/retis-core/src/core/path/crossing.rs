//! Directional interface-crossing analysis of paths.
//!
//! Every function looks at consecutive pairs `(op1, op2)` of first order-parameter
//! components. Degenerate inputs (empty or single-point paths, paths without crossings)
//! give zero counts and empty paths.

use super::error::PathError;
use super::path::{GeneratedBy, Path};
use super::phasepoint::PhasePoint;

fn order_pairs(path: &Path) -> impl Iterator<Item = (usize, f64, f64)> + '_ {
    path.phasepoints()
        .windows(2)
        .enumerate()
        .map(|(i, pair)| (i, pair[0].order_parameter(), pair[1].order_parameter()))
}

#[inline]
fn crosses(op1: f64, op2: f64, interface: f64) -> bool {
    (op2 >= interface && interface > op1) || (op1 >= interface && interface > op2)
}

#[inline]
fn crosses_forward(op1: f64, op2: f64, interface: f64) -> bool {
    op2 > interface && interface >= op1
}

/// Counts the crossings of `interface` in either direction.
pub fn crossing_counter(path: &Path, interface: f64) -> usize {
    order_pairs(path)
        .filter(|&(_, op1, op2)| crosses(op1, op2, interface))
        .count()
}

/// Returns the phase points just before and just after every crossing of `interface`.
pub fn crossing_finder(path: &Path, interface: f64) -> (Vec<&PhasePoint>, Vec<&PhasePoint>) {
    let points = path.phasepoints();
    order_pairs(path)
        .filter(|&(_, op1, op2)| crosses(op1, op2, interface))
        .map(|(i, _, _)| (&points[i], &points[i + 1]))
        .unzip()
}

/// Counts forward excursions that cross `interface_l` and later cross `interface_r`.
///
/// A right crossing only counts when a left crossing has been seen since the last
/// counted segment.
pub fn segments_counter(path: &Path, interface_l: f64, interface_r: f64) -> usize {
    let mut count = 0;
    let mut last_left: Option<usize> = None;
    for (i, op1, op2) in order_pairs(path) {
        if crosses_forward(op1, op2, interface_l) {
            last_left = Some(i);
        }
        if crosses_forward(op1, op2, interface_r) && last_left.take().is_some() {
            count += 1;
        }
    }
    count
}

/// Keeps the phase points strictly between the two interfaces.
///
/// The new path copies `maxlen`, status and time origin of `path` and shares its
/// generator.
pub fn trim_path_between_interfaces(path: &Path, interface_l: f64, interface_r: f64) -> Path {
    let mut trimmed = derived_path(path, GeneratedBy::InterfaceTrim);
    for point in path {
        let order = point.order_parameter();
        if interface_r > order && order > interface_l {
            trimmed.append(point.clone());
        }
    }
    trimmed
}

/// Extracts one segment as counted by [`segments_counter`], including the points just
/// outside both interfaces.
///
/// Segments are numbered from zero in the order they complete, that is, by their
/// forward crossing of `interface_r`. A segment starts at the latest forward crossing
/// of `interface_l` before that right crossing. Left crossings that are not followed
/// by a right crossing do not take a number, so ordinals run over the same segments
/// that [`segments_counter`] counts. Without `segment_to_pick`, the segment is drawn
/// uniformly from `0..=segments_counter(..)` with the path's own generator.
///
/// # Errors
///
/// Returns [`PathError::SegmentNotFound`] when the path has no segment with the
/// requested (or drawn) number.
pub fn select_and_trim_a_segment(
    path: &Path,
    interface_l: f64,
    interface_r: f64,
    segment_to_pick: Option<usize>,
) -> Result<Path, PathError> {
    let target = match segment_to_pick {
        Some(target) => target,
        None => path
            .rgen()
            .random_integers(0, segments_counter(path, interface_l, interface_r)),
    };

    let points = path.phasepoints();
    let mut ordinal = 0;
    let mut current: Option<Vec<&PhasePoint>> = None;
    for (i, op1, op2) in order_pairs(path) {
        if crosses_forward(op1, op2, interface_l) {
            current = Some(Vec::new());
        }
        if let Some(segment) = current.as_mut() {
            segment.push(&points[i]);
        }
        if crosses_forward(op1, op2, interface_r) {
            if let Some(mut segment) = current.take() {
                if ordinal == target {
                    segment.push(&points[i + 1]);
                    let mut selected = derived_path(path, GeneratedBy::Segment);
                    for point in segment {
                        selected.append(point.clone());
                    }
                    return Ok(selected);
                }
                ordinal += 1;
            }
        }
    }

    Err(PathError::SegmentNotFound {
        requested: target,
        available: ordinal,
    })
}

fn derived_path(path: &Path, generated: GeneratedBy) -> Path {
    let mut derived = path.empty_path();
    derived.status = path.status;
    derived.time_origin = path.time_origin;
    derived.generated = Some(generated);
    derived
}

use crate::cli::CrossingsArgs;
use crate::error::{CliError, Result};
use anyhow::anyhow;
use retis::core::path::crossing::{
    crossing_counter, crossing_finder, segments_counter, select_and_trim_a_segment,
    trim_path_between_interfaces,
};
use retis::core::path::error::PathError;
use retis::core::path::path::Path;
use retis::core::path::phasepoint::PhasePoint;
use retis::core::random::RandomHandle;
use std::path::Path as FsPath;
use tracing::{debug, info, warn};

/// Crossing statistics of one order-parameter trace.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossingReport {
    pub length: usize,
    pub crossings: usize,
    /// `(time, order)` of the points before and after every crossing.
    pub pairs: Vec<((f64, f64), (f64, f64))>,
    pub segments: Option<SegmentReport>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentReport {
    pub count: usize,
    pub trimmed_length: usize,
    /// Times of the first and last point of the selected segment, or why none was selected.
    pub selected: std::result::Result<(usize, f64, f64), PathError>,
}

pub fn run(args: CrossingsArgs) -> Result<()> {
    let path = read_trace(&args.input, RandomHandle::seeded(args.seed))?;
    info!(path = %args.input.display(), points = path.length(), "Loaded order-parameter trace.");

    let report = analyze(&path, &args);
    println!("points: {}", report.length);
    println!("crossings of {}: {}", args.interface, report.crossings);
    for ((t1, op1), (t2, op2)) in &report.pairs {
        println!("  {t1:>12.4} {op1:>12.6} -> {t2:>12.4} {op2:>12.6}");
    }
    if let Some(segments) = &report.segments {
        println!("segments: {}", segments.count);
        println!("trimmed length: {}", segments.trimmed_length);
        match &segments.selected {
            Ok((length, start, end)) => {
                println!("selected segment: {length} points, t = {start} .. {end}")
            }
            Err(e) => {
                warn!("No segment selected: {e}");
                println!("selected segment: none ({e})");
            }
        }
    }
    Ok(())
}

/// Computes crossing statistics; segment statistics need both `left` and `right`.
pub fn analyze(path: &Path, args: &CrossingsArgs) -> CrossingReport {
    let (before, after) = crossing_finder(path, args.interface);
    let point = |p: &PhasePoint| (p.time, p.order_parameter());
    let pairs = before
        .into_iter()
        .zip(after)
        .map(|(b, a)| (point(b), point(a)))
        .collect();

    let segments = args.left.zip(args.right).map(|(left, right)| {
        let selected = select_and_trim_a_segment(path, left, right, args.segment).and_then(|segment| {
            match (segment.start_point(), segment.end_point()) {
                (Some(start), Some(end)) => Ok((segment.length(), start.time, end.time)),
                _ => Err(PathError::SegmentNotFound {
                    requested: args.segment.unwrap_or(0),
                    available: 0,
                }),
            }
        });
        SegmentReport {
            count: segments_counter(path, left, right),
            trimmed_length: trim_path_between_interfaces(path, left, right).length(),
            selected,
        }
    });

    CrossingReport {
        length: path.length(),
        crossings: crossing_counter(path, args.interface),
        pairs,
        segments,
    }
}

/// Reads a whitespace separated `time order` trace into a path.
///
/// Blank lines and lines starting with `#` are skipped; columns beyond the second are
/// ignored.
pub fn read_trace(file: &FsPath, rgen: RandomHandle) -> Result<Path> {
    let content = std::fs::read_to_string(file)?;
    let parse_error = |line: usize, message: String| CliError::FileParsing {
        path: file.to_path_buf(),
        source: anyhow!("line {line}: {message}"),
    };

    let mut path = Path::new(rgen, None);
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut columns = line.split_whitespace();
        let (Some(time), Some(order)) = (columns.next(), columns.next()) else {
            return Err(parse_error(idx + 1, "expected two columns".to_string()));
        };
        let time: f64 = time
            .parse()
            .map_err(|e| parse_error(idx + 1, format!("invalid time '{time}': {e}")))?;
        let order: f64 = order
            .parse()
            .map_err(|e| parse_error(idx + 1, format!("invalid order '{order}': {e}")))?;
        path.append(PhasePoint::scalar(order, time));
    }
    debug!(points = path.length(), "Parsed trace.");
    Ok(path)
}

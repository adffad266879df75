use super::phasepoint::PhasePoint;
use crate::core::random::RandomHandle;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Outcome codes of path-sampling moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Accepted,
    BackwardWrongInterface,
    BackwardTooLong,
    BackwardTooShort,
    BackwardMaxLength,
    ForwardTooLong,
    ForwardTooShort,
    ForwardMaxLength,
    KickedOutsideBoundaries,
    NoCrossing,
    EndsAtWrongInterface,
    StartsAtWrongInterface,
    ZeroMinusEndsLeft,
    MomentaChangeRejected,
    TargetSwapRejected,
}

impl Status {
    pub const ALL: [Status; 15] = [
        Status::Accepted,
        Status::BackwardWrongInterface,
        Status::BackwardTooLong,
        Status::BackwardTooShort,
        Status::BackwardMaxLength,
        Status::ForwardTooLong,
        Status::ForwardTooShort,
        Status::ForwardMaxLength,
        Status::KickedOutsideBoundaries,
        Status::NoCrossing,
        Status::EndsAtWrongInterface,
        Status::StartsAtWrongInterface,
        Status::ZeroMinusEndsLeft,
        Status::MomentaChangeRejected,
        Status::TargetSwapRejected,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Status::Accepted => "ACC",
            Status::BackwardWrongInterface => "BWI",
            Status::BackwardTooLong => "BTL",
            Status::BackwardTooShort => "BTS",
            Status::BackwardMaxLength => "BTX",
            Status::ForwardTooLong => "FTL",
            Status::ForwardTooShort => "FTS",
            Status::ForwardMaxLength => "FTX",
            Status::KickedOutsideBoundaries => "KOB",
            Status::NoCrossing => "NCR",
            Status::EndsAtWrongInterface => "EWI",
            Status::StartsAtWrongInterface => "SWI",
            Status::ZeroMinusEndsLeft => "0-L",
            Status::MomentaChangeRejected => "MCR",
            Status::TargetSwapRejected => "TSS",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Status::Accepted => "The path has been accepted",
            Status::BackwardWrongInterface => "Backward trajectory ended at the wrong interface",
            Status::BackwardTooLong => "Backward trajectory too long (detailed balance condition)",
            Status::BackwardTooShort => "Backward trajectory too short",
            Status::BackwardMaxLength => "Backward trajectory too long (maximum length exceeded)",
            Status::ForwardTooLong => "Forward trajectory too long (detailed balance condition)",
            Status::ForwardTooShort => "Forward trajectory too short",
            Status::ForwardMaxLength => "Forward trajectory too long (maximum length exceeded)",
            Status::KickedOutsideBoundaries => "Kicked outside of the boundaries",
            Status::NoCrossing => "No crossing with the middle interface",
            Status::EndsAtWrongInterface => "Path ends at the wrong interface",
            Status::StartsAtWrongInterface => "Path starts at the wrong interface",
            Status::ZeroMinusEndsLeft => "Path in the [0^-] ensemble ends at the left interface",
            Status::MomentaChangeRejected => "Rejected by the momenta change",
            Status::TargetSwapRejected => "Rejected by the target swap selection",
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Status::Accepted)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.code() == s)
            .ok_or_else(|| format!("Unknown path status code: '{s}'"))
    }
}

/// The operation that produced a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeneratedBy {
    Shooting,
    TimeReversal,
    Kick,
    SwapPlus,
    SwapMinus,
    NullMove,
    Load,
    InterfaceTrim,
    Segment,
}

impl GeneratedBy {
    pub fn code(&self) -> &'static str {
        match self {
            GeneratedBy::Shooting => "sh",
            GeneratedBy::TimeReversal => "tr",
            GeneratedBy::Kick => "ki",
            GeneratedBy::SwapPlus => "s+",
            GeneratedBy::SwapMinus => "s-",
            GeneratedBy::NullMove => "00",
            GeneratedBy::Load => "ld",
            GeneratedBy::InterfaceTrim => "ct",
            GeneratedBy::Segment => "sg",
        }
    }
}

impl fmt::Display for GeneratedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The left, middle and right interface of a path ensemble.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interfaces {
    pub left: f64,
    pub middle: f64,
    pub right: f64,
}

impl Interfaces {
    pub fn new(left: f64, middle: f64, right: f64) -> Self {
        Self {
            left,
            middle,
            right,
        }
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.left, self.middle, self.right]
    }
}

/// Which side of the interfaces a path point lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// The result of [`Path::check_interfaces`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceCheck {
    /// Side of the first point, `None` when it lies strictly between the outer interfaces.
    pub start: Option<Side>,
    pub end: Option<Side>,
    /// Whether the middle interface is crossed.
    pub middle_crossed: bool,
    /// Crossing flags for the left, middle and right interface.
    pub crossed: [bool; 3],
}

/// An ordered trajectory and its sampling metadata.
///
/// Paths derived from one another share one random generator through their
/// [`RandomHandle`]. Equality ignores the generator.
#[derive(Debug, Clone)]
pub struct Path {
    phasepoints: Vec<PhasePoint>,
    maxlen: Option<usize>,
    pub status: Option<Status>,
    pub time_origin: i64,
    pub generated: Option<GeneratedBy>,
    rgen: RandomHandle,
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.phasepoints == other.phasepoints
            && self.maxlen == other.maxlen
            && self.status == other.status
            && self.time_origin == other.time_origin
            && self.generated == other.generated
    }
}

impl Path {
    pub fn new(rgen: RandomHandle, maxlen: Option<usize>) -> Self {
        Self {
            phasepoints: Vec::new(),
            maxlen,
            status: None,
            time_origin: 0,
            generated: None,
            rgen,
        }
    }

    pub fn rgen(&self) -> &RandomHandle {
        &self.rgen
    }

    pub fn maxlen(&self) -> Option<usize> {
        self.maxlen
    }

    pub fn phasepoints(&self) -> &[PhasePoint] {
        &self.phasepoints
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PhasePoint> {
        self.phasepoints.iter()
    }

    /// Appends a phase point. Returns `false` without appending when the path is full.
    pub fn append(&mut self, phasepoint: PhasePoint) -> bool {
        if self.maxlen.is_some_and(|maxlen| self.phasepoints.len() >= maxlen) {
            return false;
        }
        self.phasepoints.push(phasepoint);
        true
    }

    pub fn length(&self) -> usize {
        self.phasepoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phasepoints.is_empty()
    }

    pub fn start_point(&self) -> Option<&PhasePoint> {
        self.phasepoints.first()
    }

    pub fn end_point(&self) -> Option<&PhasePoint> {
        self.phasepoints.last()
    }

    /// The smallest order parameter and the index of its first occurrence.
    pub fn ordermin(&self) -> Option<(f64, usize)> {
        self.extremum(|candidate, best| candidate < best)
    }

    /// The largest order parameter and the index of its first occurrence.
    pub fn ordermax(&self) -> Option<(f64, usize)> {
        self.extremum(|candidate, best| candidate > best)
    }

    fn extremum(&self, better: impl Fn(f64, f64) -> bool) -> Option<(f64, usize)> {
        let mut points = self.phasepoints.iter().enumerate();
        let (_, first) = points.next()?;
        let mut best = (first.order_parameter(), 0);
        for (i, point) in points {
            if better(point.order_parameter(), best.0) {
                best = (point.order_parameter(), i);
            }
        }
        Some(best)
    }

    /// Returns a path without phase points that keeps `maxlen` and shares the generator.
    pub fn empty_path(&self) -> Path {
        Path::new(self.rgen.share(), self.maxlen)
    }

    /// Returns the time-reversed path with reversed velocities.
    pub fn reverse(&self) -> Path {
        let mut reversed = self.empty_path();
        reversed.status = self.status;
        reversed.time_origin = self.time_origin;
        reversed.generated = Some(GeneratedBy::TimeReversal);
        for point in self.phasepoints.iter().rev() {
            let mut point = point.clone();
            if let Some(particles) = point.particles.as_mut() {
                particles.reverse_velocities();
            }
            if !reversed.append(point) {
                warn!(maxlen = ?self.maxlen, "Reversed path exceeded its maximum length.");
                break;
            }
        }
        reversed
    }

    /// Classifies the path with respect to a set of interfaces.
    ///
    /// An interface counts as crossed when `ordermin < interface <= ordermax`. Returns
    /// `None` for an empty path.
    pub fn check_interfaces(&self, interfaces: &Interfaces) -> Option<InterfaceCheck> {
        let (ordermin, _) = self.ordermin()?;
        let (ordermax, _) = self.ordermax()?;
        let crossed = interfaces
            .as_array()
            .map(|interface| ordermin < interface && interface <= ordermax);
        let left = interfaces.left.min(interfaces.right);
        let right = interfaces.left.max(interfaces.right);
        let side = |point: Option<&PhasePoint>| {
            point.and_then(|point| {
                let order = point.order_parameter();
                if order <= left {
                    Some(Side::Left)
                } else if order >= right {
                    Some(Side::Right)
                } else {
                    None
                }
            })
        };
        Some(InterfaceCheck {
            start: side(self.start_point()),
            end: side(self.end_point()),
            middle_crossed: crossed[1],
            crossed,
        })
    }

    /// Whether the path reaches beyond `target`.
    pub fn success(&self, target: f64) -> bool {
        self.ordermax().is_some_and(|(ordermax, _)| ordermax > target)
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a PhasePoint;
    type IntoIter = std::slice::Iter<'a, PhasePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.phasepoints.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::path::phasepoint::ParticleSnapshot;
    use nalgebra::DMatrix;

    fn path_from_orders(orders: &[f64]) -> Path {
        let mut path = Path::new(RandomHandle::seeded(0), None);
        for (i, &order) in orders.iter().enumerate() {
            path.append(PhasePoint::scalar(order, i as f64));
        }
        path
    }

    #[test]
    fn append_refuses_points_beyond_maxlen() {
        let mut path = Path::new(RandomHandle::seeded(0), Some(2));
        assert!(path.append(PhasePoint::scalar(0.1, 0.0)));
        assert!(path.append(PhasePoint::scalar(0.2, 1.0)));
        assert!(!path.append(PhasePoint::scalar(0.3, 2.0)));
        assert_eq!(path.length(), 2);
    }

    #[test]
    fn ordermin_and_ordermax_report_first_occurrence() {
        let path = path_from_orders(&[0.4, 0.1, 0.9, 0.1, 0.9]);
        assert_eq!(path.ordermin(), Some((0.1, 1)));
        assert_eq!(path.ordermax(), Some((0.9, 2)));
        assert_eq!(path_from_orders(&[]).ordermax(), None);
    }

    #[test]
    fn empty_path_shares_generator_and_maxlen() {
        let mut path = Path::new(RandomHandle::seeded(3), Some(10));
        path.append(PhasePoint::scalar(0.1, 0.0));
        path.status = Some(Status::Accepted);
        let empty = path.empty_path();
        assert!(empty.is_empty());
        assert_eq!(empty.maxlen(), Some(10));
        assert_eq!(empty.status, None);
        assert!(empty.rgen().is_shared_with(path.rgen()));
    }

    #[test]
    fn reverse_flips_order_and_velocities() {
        let mut path = Path::new(RandomHandle::seeded(0), None);
        for (i, vel) in [1.0, 2.0].into_iter().enumerate() {
            let snapshot = ParticleSnapshot {
                pos: DMatrix::zeros(1, 1),
                vel: DMatrix::from_element(1, 1, vel),
                vpot: 0.0,
                ekin: 0.0,
            };
            path.append(PhasePoint::scalar(i as f64, i as f64).with_particles(snapshot));
        }
        let reversed = path.reverse();
        assert_eq!(reversed.generated, Some(GeneratedBy::TimeReversal));
        let orders: Vec<f64> = reversed.iter().map(PhasePoint::order_parameter).collect();
        assert_eq!(orders, vec![1.0, 0.0]);
        let first_vel = reversed.start_point().unwrap().particles.as_ref().unwrap().vel[(0, 0)];
        assert_eq!(first_vel, -2.0);
    }

    #[test]
    fn check_interfaces_classifies_a_full_transition() {
        let path = path_from_orders(&[0.05, 0.3, 0.6, 1.2]);
        let check = path
            .check_interfaces(&Interfaces::new(0.1, 0.5, 1.0))
            .unwrap();
        assert_eq!(check.start, Some(Side::Left));
        assert_eq!(check.end, Some(Side::Right));
        assert!(check.middle_crossed);
        assert_eq!(check.crossed, [true, true, true]);
    }

    #[test]
    fn check_interfaces_reports_unfinished_paths() {
        let path = path_from_orders(&[0.05, 0.3, 0.4]);
        let check = path
            .check_interfaces(&Interfaces::new(0.1, 0.5, 1.0))
            .unwrap();
        assert_eq!(check.end, None);
        assert!(!check.middle_crossed);
        assert_eq!(check.crossed, [true, false, false]);
        assert_eq!(path_from_orders(&[]).check_interfaces(&Interfaces::new(0.1, 0.5, 1.0)), None);
    }

    #[test]
    fn success_requires_strictly_exceeding_target() {
        let path = path_from_orders(&[0.1, 0.5]);
        assert!(path.success(0.4));
        assert!(!path.success(0.5));
    }

    #[test]
    fn status_codes_round_trip_through_from_str() {
        for status in Status::ALL {
            assert_eq!(status.code().parse::<Status>(), Ok(status));
        }
        assert!("XYZ".parse::<Status>().is_err());
        assert_eq!(Status::ZeroMinusEndsLeft.to_string(), "0-L");
    }

    #[test]
    fn equality_ignores_random_generator() {
        let a = path_from_orders(&[0.1, 0.2]);
        let b = path_from_orders(&[0.1, 0.2]);
        b.rgen().rand();
        assert_eq!(a, b);
    }
}

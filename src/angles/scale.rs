//! Tick ladder for the angular gauges: which step size to label and how to
//! render a tick value at that granularity.

use super::sexagesimal::AngleUnit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepLevel {
    Large,
    Medium,
    Small,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    amount: u32,
    per_degree: u32,
    pub level: StepLevel,
}

impl Step {
    const fn large(amount: u32) -> Self {
        Self {
            amount,
            per_degree: 1,
            level: StepLevel::Large,
        }
    }

    const fn medium(arc_minutes: u32) -> Self {
        Self {
            amount: arc_minutes,
            per_degree: 60,
            level: StepLevel::Medium,
        }
    }

    const fn small(arc_seconds: u32) -> Self {
        Self {
            amount: arc_seconds,
            per_degree: 3600,
            level: StepLevel::Small,
        }
    }

    /// Step size in decimal degrees (or hours).
    pub fn size(&self) -> f64 {
        self.amount as f64 / self.per_degree as f64
    }

    pub fn format(&self, value: f64, unit: AngleUnit) -> String {
        match self.level {
            StepLevel::Large => format_whole(value, unit),
            StepLevel::Medium => format_arc_minutes(value, unit),
            StepLevel::Small => format_arc_seconds(value, unit),
        }
    }
}

/// Coarsest first.
pub const STEPS: [Step; 24] = [
    Step::large(200),
    Step::large(180),
    Step::large(90),
    Step::large(30),
    Step::large(15),
    Step::large(10),
    Step::large(6),
    Step::large(5),
    Step::large(3),
    Step::large(2),
    Step::large(1),
    Step::medium(30),
    Step::medium(20),
    Step::medium(15),
    Step::medium(10),
    Step::medium(5),
    Step::medium(2),
    Step::medium(1),
    Step::small(30),
    Step::small(20),
    Step::small(15),
    Step::small(10),
    Step::small(5),
    Step::small(2),
];

pub fn format_whole(value: f64, unit: AngleUnit) -> String {
    format!("{}{}", value.round() as i64, unit.symbols().whole)
}

pub fn format_arc_minutes(value: f64, unit: AngleUnit) -> String {
    let arc_minutes = ((value % 1.0) * 60.0).round() as i64;
    if arc_minutes == 0 {
        format_whole(value.floor(), unit)
    } else {
        format!("{}{}", arc_minutes, unit.symbols().minutes)
    }
}

pub fn format_arc_seconds(value: f64, unit: AngleUnit) -> String {
    let arc_seconds = ((value * 3600.0) % 60.0).round() as i64;
    let arc_minutes = ((value * 60.0) % 60.0).floor() as i64;
    if arc_seconds != 0 {
        format!("{}{}", arc_seconds, unit.symbols().seconds)
    } else if arc_minutes != 0 {
        format!("{}{}", arc_minutes, unit.symbols().minutes)
    } else {
        format_whole(value.floor(), unit)
    }
}

/// Renders `value` at the coarsest granularity that represents it.
pub fn format_angle(value: f64, unit: AngleUnit) -> String {
    if value >= 1.0 {
        format_whole(value, unit)
    } else if value >= 1.0 / 60.0 {
        format_arc_minutes(value, unit)
    } else {
        format_arc_seconds(value, unit)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClosestSteps {
    pub next_up: Option<f64>,
    pub next_down: Option<f64>,
}

/// Nearest ladder steps strictly above and below `current`, for zooming.
pub fn closest_steps(current: f64) -> ClosestSteps {
    STEPS
        .iter()
        .map(Step::size)
        .fold(ClosestSteps::default(), |mut acc, size| {
            if size > current && acc.next_up.map_or(true, |up| size < up) {
                acc.next_up = Some(size);
            } else if size < current && acc.next_down.map_or(true, |down| size > down) {
                acc.next_down = Some(size);
            }
            acc
        })
}

/// Picks the step whose label count over `range` falls within the bounds.
///
/// Falls back to the coarsest eligible step giving at least one label, then
/// to the first large step.
pub fn select_step(range: f64, min_labels: u32, max_labels: u32) -> Step {
    let eligible: Vec<&Step> = STEPS
        .iter()
        .filter(|step| match step.level {
            StepLevel::Small => range < 8.0 / 60.0,
            StepLevel::Medium => range < 8.0,
            StepLevel::Large => true,
        })
        .collect();

    let labels = |step: &Step| (range / step.size()).floor();

    eligible
        .iter()
        .find(|step| {
            let count = labels(step);
            count >= min_labels as f64 && count <= max_labels as f64
        })
        .or_else(|| eligible.iter().find(|step| labels(step) >= 1.0))
        .map(|step| **step)
        .unwrap_or(STEPS[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_by_granularity() {
        assert_eq!(format_angle(12.4, AngleUnit::Degrees), "12°");
        assert_eq!(format_angle(0.5, AngleUnit::Degrees), "30′");
        assert_eq!(format_angle(10.0 / 3600.0, AngleUnit::Degrees), "10″");
        assert_eq!(format_angle(3.0, AngleUnit::Hours), "3h");
        assert_eq!(format_arc_minutes(2.0, AngleUnit::Degrees), "2°");
        assert_eq!(format_arc_seconds(0.25, AngleUnit::Degrees), "15′");
    }

    #[test]
    fn closest_steps_bracket_current() {
        let around_one = closest_steps(1.0);
        assert_eq!(around_one.next_up, Some(2.0));
        assert_eq!(around_one.next_down, Some(0.5));

        let top = closest_steps(200.0);
        assert_eq!(top.next_up, None);
        assert_eq!(top.next_down, Some(180.0));

        let bottom = closest_steps(1.0 / 3600.0);
        assert_eq!(bottom.next_up, Some(2.0 / 3600.0));
        assert_eq!(bottom.next_down, None);
    }

    #[test]
    fn select_step_respects_label_bounds() {
        let step = select_step(60.0, 4, 8);
        assert_eq!(step.size(), 15.0);
        assert_eq!(step.level, StepLevel::Large);

        let fine = select_step(2.0, 4, 8);
        assert_eq!(fine.level, StepLevel::Medium);
        assert_eq!(fine.size(), 0.5);

        // Small steps are only eligible on tight ranges.
        let tight = select_step(0.01, 3, 6);
        assert_eq!(tight.level, StepLevel::Small);
        assert_eq!(tight.size(), 10.0 / 3600.0);
        assert_eq!(tight.format(0.005, AngleUnit::Degrees), "18″");
    }

    #[test]
    fn select_step_falls_back() {
        // Only large steps are eligible over 10 degrees and none gives 100 labels.
        let step = select_step(10.0, 100, 200);
        assert_eq!(step.size(), 10.0);
        // Nothing fits at all.
        assert_eq!(select_step(0.0, 1, 2), STEPS[0]);
    }
}

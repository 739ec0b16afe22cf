mod scale;
mod sexagesimal;
mod wrap;

pub use scale::{
    closest_steps, format_angle, format_arc_minutes, format_arc_seconds, format_whole,
    select_step, ClosestSteps, Step, StepLevel, STEPS,
};
pub use sexagesimal::{
    from_sexagesimal, to_sexagesimal, AngleUnit, Sexagesimal, UnitSymbols, MAX_PRECISION,
};
pub use wrap::{
    angular_difference, is_angle_between, wrap_to_180, wrap_to_24, wrap_to_360, wrap_to_90,
};

//! Activity codes accepted in `workout_type_id`.
//!
//! The numeric codes are an upstream contract and are not contiguous
//! (48, 50-55 are unassigned).

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i64)]
pub enum WorkoutType {
    Biking = 0,
    Running = 1,
    Fe = 2,
    RunningTrack = 3,
    RunningTrail = 4,
    RunningTreadmill = 5,
    Walking = 6,
    WalkingSpeed = 7,
    WalkingNordic = 8,
    Hiking = 9,
    Mountaineering = 10,
    BikingCyclocross = 11,
    BikingIndoor = 12,
    BikingMountain = 13,
    BikingRecumbent = 14,
    BikingRoad = 15,
    BikingTrack = 16,
    BikingMotorcycling = 17,
    FeGeneral = 18,
    FeTreadmill = 19,
    FeElliptical = 20,
    FeBike = 21,
    FeRower = 22,
    FeClimber = 23,
    Swimming = 24,
    SwimmingLap = 25,
    SwimmingOpenWater = 26,
    Snowboarding = 27,
    Skiing = 28,
    SkiingDownhill = 29,
    SkiingCrossCountry = 30,
    Skating = 31,
    SkatingIce = 32,
    SkatingInline = 33,
    LongBoarding = 34,
    Sailing = 35,
    Windsurfing = 36,
    Canoeing = 37,
    Kayaking = 38,
    Rowing = 39,
    Kiteboarding = 40,
    StandUpPaddleBoard = 41,
    GenericWorkout = 42,
    CardioClass = 43,
    StairClimber = 44,
    Wheelchair = 45,
    Golfing = 46,
    Other = 47,
    BikingIndoorCyclingClass = 49,
    WalkingTreadmill = 56,
    FeStepper = 57,
    FeStepMill = 58,
    FeTreadClimber = 59,
    FeTotalBody = 60,
    BikingIndoorTrainer = 61,
}

impl WorkoutType {
    pub const ALL: [WorkoutType; 55] = [
        Self::Biking,
        Self::Running,
        Self::Fe,
        Self::RunningTrack,
        Self::RunningTrail,
        Self::RunningTreadmill,
        Self::Walking,
        Self::WalkingSpeed,
        Self::WalkingNordic,
        Self::Hiking,
        Self::Mountaineering,
        Self::BikingCyclocross,
        Self::BikingIndoor,
        Self::BikingMountain,
        Self::BikingRecumbent,
        Self::BikingRoad,
        Self::BikingTrack,
        Self::BikingMotorcycling,
        Self::FeGeneral,
        Self::FeTreadmill,
        Self::FeElliptical,
        Self::FeBike,
        Self::FeRower,
        Self::FeClimber,
        Self::Swimming,
        Self::SwimmingLap,
        Self::SwimmingOpenWater,
        Self::Snowboarding,
        Self::Skiing,
        Self::SkiingDownhill,
        Self::SkiingCrossCountry,
        Self::Skating,
        Self::SkatingIce,
        Self::SkatingInline,
        Self::LongBoarding,
        Self::Sailing,
        Self::Windsurfing,
        Self::Canoeing,
        Self::Kayaking,
        Self::Rowing,
        Self::Kiteboarding,
        Self::StandUpPaddleBoard,
        Self::GenericWorkout,
        Self::CardioClass,
        Self::StairClimber,
        Self::Wheelchair,
        Self::Golfing,
        Self::Other,
        Self::BikingIndoorCyclingClass,
        Self::WalkingTreadmill,
        Self::FeStepper,
        Self::FeStepMill,
        Self::FeTreadClimber,
        Self::FeTotalBody,
        Self::BikingIndoorTrainer,
    ];

    /// Upstream numeric code.
    #[must_use]
    pub const fn code(self) -> i64 {
        self as i64
    }

    /// Snake-case label, e.g. `biking_indoor_trainer`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Biking => "biking",
            Self::Running => "running",
            Self::Fe => "fe",
            Self::RunningTrack => "running_track",
            Self::RunningTrail => "running_trail",
            Self::RunningTreadmill => "running_treadmill",
            Self::Walking => "walking",
            Self::WalkingSpeed => "walking_speed",
            Self::WalkingNordic => "walking_nordic",
            Self::Hiking => "hiking",
            Self::Mountaineering => "mountaineering",
            Self::BikingCyclocross => "biking_cyclocross",
            Self::BikingIndoor => "biking_indoor",
            Self::BikingMountain => "biking_mountain",
            Self::BikingRecumbent => "biking_recumbent",
            Self::BikingRoad => "biking_road",
            Self::BikingTrack => "biking_track",
            Self::BikingMotorcycling => "biking_motorcycling",
            Self::FeGeneral => "fe_general",
            Self::FeTreadmill => "fe_treadmill",
            Self::FeElliptical => "fe_elliptical",
            Self::FeBike => "fe_bike",
            Self::FeRower => "fe_rower",
            Self::FeClimber => "fe_climber",
            Self::Swimming => "swimming",
            Self::SwimmingLap => "swimming_lap",
            Self::SwimmingOpenWater => "swimming_open_water",
            Self::Snowboarding => "snowboarding",
            Self::Skiing => "skiing",
            Self::SkiingDownhill => "skiing_downhill",
            Self::SkiingCrossCountry => "skiing_cross_country",
            Self::Skating => "skating",
            Self::SkatingIce => "skating_ice",
            Self::SkatingInline => "skating_inline",
            Self::LongBoarding => "long_boarding",
            Self::Sailing => "sailing",
            Self::Windsurfing => "windsurfing",
            Self::Canoeing => "canoeing",
            Self::Kayaking => "kayaking",
            Self::Rowing => "rowing",
            Self::Kiteboarding => "kiteboarding",
            Self::StandUpPaddleBoard => "stand_up_paddle_board",
            Self::GenericWorkout => "generic_workout",
            Self::CardioClass => "cardio_class",
            Self::StairClimber => "stair_climber",
            Self::Wheelchair => "wheelchair",
            Self::Golfing => "golfing",
            Self::Other => "other",
            Self::BikingIndoorCyclingClass => "biking_indoor_cycling_class",
            Self::WalkingTreadmill => "walking_treadmill",
            Self::FeStepper => "fe_stepper",
            Self::FeStepMill => "fe_step_mill",
            Self::FeTreadClimber => "fe_tread_climber",
            Self::FeTotalBody => "fe_total_body",
            Self::BikingIndoorTrainer => "biking_indoor_trainer",
        }
    }
}

impl fmt::Display for WorkoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkoutTypeError {
    #[error("unknown workout type code {0}")]
    UnknownCode(i64),

    #[error("unknown workout type '{0}'")]
    UnknownLabel(String),
}

impl TryFrom<i64> for WorkoutType {
    type Error = WorkoutTypeError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.code() == code)
            .ok_or(WorkoutTypeError::UnknownCode(code))
    }
}

impl FromStr for WorkoutType {
    type Err = WorkoutTypeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.label() == normalized)
            .ok_or_else(|| WorkoutTypeError::UnknownLabel(value.to_string()))
    }
}

impl From<WorkoutType> for i64 {
    fn from(kind: WorkoutType) -> Self {
        kind.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn codes_are_the_upstream_contract() {
        assert_eq!(WorkoutType::Biking.code(), 0);
        assert_eq!(WorkoutType::Other.code(), 47);
        assert_eq!(WorkoutType::BikingIndoorCyclingClass.code(), 49);
        assert_eq!(WorkoutType::WalkingTreadmill.code(), 56);
        assert_eq!(WorkoutType::BikingIndoorTrainer.code(), 61);
    }

    #[test]
    fn gaps_are_rejected() {
        for code in [48, 50, 51, 52, 53, 54, 55, 62, -1] {
            assert_eq!(
                WorkoutType::try_from(code),
                Err(WorkoutTypeError::UnknownCode(code))
            );
        }
    }

    #[test]
    fn every_variant_round_trips() {
        let mut codes = HashSet::new();
        let mut labels = HashSet::new();
        for kind in WorkoutType::ALL {
            assert_eq!(WorkoutType::try_from(kind.code()), Ok(kind));
            assert_eq!(kind.label().parse::<WorkoutType>(), Ok(kind));
            assert!(codes.insert(kind.code()));
            assert!(labels.insert(kind.label()));
        }
    }

    #[test]
    fn labels_parse_loosely() {
        assert_eq!("Open Water".parse::<WorkoutType>().ok(), None);
        assert_eq!(
            "Swimming Open-Water".parse::<WorkoutType>(),
            Ok(WorkoutType::SwimmingOpenWater)
        );
        assert_eq!(WorkoutType::SkiingCrossCountry.to_string(), "skiing_cross_country");
    }
}

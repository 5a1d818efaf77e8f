pub mod allocator;
pub mod config;
pub mod domain;
pub mod errors;
pub mod pricing;
pub mod splitter;
pub mod tier;

pub use allocator::{
    Allocation, AllocationRequest, AllocatorSettings, AnnealingSchedule, RoutineAllocator,
    StopSignal,
};
pub use domain::catalog::ProductOption;
pub use domain::record::{DailyRoutineRecord, RoutinePractice, RoutineRecord};
pub use domain::routine::{Routine, RoutineCreate, RoutineId, RoutineItem, UserId};
pub use domain::step::{Step, UsageTime};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use pricing::{PriceObservation, PriceSegment, PriceSegmentStore, PriceSegmentTable};
pub use splitter::{split, ResolvedPick, SplitRoutine};
pub use tier::{classify, InvalidTierError, Level, TierThresholds, UserTier};

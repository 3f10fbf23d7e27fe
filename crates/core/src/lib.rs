//! Core types and traits for assess-report
//!
//! Domain records shared by every crate, the provider collaborator traits,
//! and the content-tree / score roll-up utilities used by report variants.

mod macros;

pub mod catalog;
pub mod constants;
pub mod content_tree;
pub mod directory;
mod env_config;
mod error;
pub mod providers;
pub mod room;
pub mod schedule;
pub mod score;
pub mod subject;

pub use catalog::{ContentType, ContentView, FileType, Outcome};
pub use content_tree::{ContentNode, NumberedRow, TreeItem, build_forest};
pub use directory::{ClassInfo, Program, SubjectArea, User};
pub use env_config::{env_parse_optional, env_parse_with_default};
pub use error::{CoreError, ProviderError, ProviderResult};
pub use providers::{CatalogProvider, DirectoryProvider, LiveSessionProvider, ScheduleProvider};
pub use room::{
    AddCommentRequest, ContentKey, RoomComment, RoomContentType, RoomInfo, RoomOptions,
    RoomScoreRecord, RoomUserScores, SetScoreRequest,
};
pub use schedule::{
    LockedContent, RelationType, Schedule, ScheduleRelation, StudentFeedback, StudentReview,
};
pub use score::{ScoreSummary, roll_up, summarize_subtree};
pub use subject::{
    ContentStatus, MigrationFlag, OutcomeKey, OutcomeStatus, ParticipationStatus,
    ReviewerFeedback, Subject, SubjectContent, SubjectContentType, SubjectKind, SubjectStatus,
    SubjectUser, SubjectUserOutcome, UserType,
};

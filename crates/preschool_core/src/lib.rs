pub mod assessment;
pub mod attendance;
pub mod bulk;
pub mod dates;
pub mod domain;
pub mod finance;
pub mod grading;
pub mod ports;
pub mod roster;
pub mod validation;

pub use domain::{
    AcademicReport, AttendanceEntry, AttendanceRecord, AttendanceStatus, AuthSession, ClassName,
    Event, FinanceKind, FinancialRecord, Language, MarkedStatus, NewStudent, NewUser, ParentInfo,
    Remark, RemarkKind, Role, Student, SubjectMarks, Term, User, UserCredentials,
    UserPreferences, UserSnapshot,
};
pub use ports::{DatabaseService, PortError, PortResult, StudentFilter};

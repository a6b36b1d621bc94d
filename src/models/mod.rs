pub mod medicine;
pub mod prescription;
pub mod user;

pub use medicine::MedicineSummary;
pub use prescription::{PrescriptionRecord, RecordLine};
pub use user::{Role, SessionUser};

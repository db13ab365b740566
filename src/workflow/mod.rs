//! Workflow: session state and the controller that moves it.

pub mod controller;
pub mod state;

pub use controller::WorkflowController;
pub use state::{
    Completion, ExportSnapshot, ProcessingResult, SessionState, SubmissionId, SubmissionTicket,
    TextVariant,
};

//! Line protocol spoken by the analysis subprocesses.
//!
//! Every stdout line is classified by [`parse_line`] into a
//! [`ProtocolLine`]; the orchestrator never looks at raw strings.
//! The `RESULTS:` payloads are decoded by the functions in [`results`].

mod line;
pub mod results;

pub use line::{parse_line, ProtocolLine, PROGRESS_PREFIX, RESULTS_PREFIX};
pub use results::{decode_face_results, decode_transcript, ProtocolError};

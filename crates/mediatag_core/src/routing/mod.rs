//! Destination routing for tagged files.
//!
//! Local runs keep a `tagged_` sibling (or swap over the original). Network
//! runs copy into the share's finished or B-roll layout, falling back to
//! local staging with a warning when the share can't be reached.

mod copier;
mod destination;
mod errors;
mod mount;
mod router;

pub use copier::{BatchCopier, CopyProgress, COPY_BUFFER_SIZE};
pub use destination::{project_folder_name, staged_path, NetworkLayout};
pub use errors::{RoutingError, RoutingResult};
pub use mount::{MountHelper, MountStatus};
pub use router::{DestinationRouter, RouteTarget, RoutedFile, RoutingFailure, RoutingReport};

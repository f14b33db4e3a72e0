//! CellDock host daemon library: broadcast-session management over the hub
//! link, protocol dispatch, and the inspection bridge to the vision
//! collaborators (capture source, classifier, presentation sink).

pub mod config;
pub mod handler;
pub mod link;
pub mod session;
pub mod vision;

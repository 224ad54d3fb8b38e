pub mod diff;
pub mod patch;
pub mod protocol;
pub mod sync;

pub use diff::{Change, ChangeKind, ChangeState, Diff, FormChange, Forms, diff_models};
pub use patch::{
    NewComponent, PatchError, TextEdit, apply_edits, change_property, delete_component,
    insert_component, insert_form,
};
pub use protocol::{DesignerRequest, ProtocolError, UpdateMessage};
pub use sync::{SyncConfig, SyncEngine, SyncError, SyncUpdate};

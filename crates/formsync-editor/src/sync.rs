//! Bidirectional sync engine: script text ↔ visual designer.
//!
//! - **Text → Designer**: every reparse builds a fresh model and diffs it
//!   against the previous one; the change log for the form open in the
//!   designer becomes an outbound `update` message.
//!
//! - **Designer → Text**: inbound requests are turned into text edits by
//!   the patch generator. The host applies them to its buffer; the engine
//!   sees them again as ordinary text changes.

use crate::diff::{Diff, FormChange, Forms, diff_models};
use crate::patch::{
    PatchError, TextEdit, apply_edits, change_property, delete_component, insert_component,
};
use crate::protocol::{DesignerRequest, ProtocolError, UpdateMessage, value_text};
use formsync_core::diagnostic::Diagnostic;
use formsync_core::model::{Range, SourceModel};
use formsync_core::{ParseError, build_source};
use ropey::Rope;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

/// When host text changes trigger a reparse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// Reparse as soon as a change inserts a line break.
    pub update_on_enter: bool,
    /// Reparse as soon as a change inserts a `;`.
    pub update_on_semicolon: bool,
    /// Debounce for every other change; the host calls `flush` after it.
    pub reparse_delay_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            update_on_enter: true,
            update_on_semicolon: true,
            reparse_delay_ms: 500,
        }
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Patch(#[from] PatchError),
    #[error("no model has been built yet")]
    NoModel,
}

/// Outcome of one reparse.
#[derive(Debug, Clone, Default)]
pub struct SyncUpdate {
    pub forms: Forms,
    /// Build diagnostics followed by diff diagnostics.
    pub diagnostics: Vec<Diagnostic>,
}

/// Holds the live script text and the last successfully built model.
pub struct SyncEngine {
    file_name: String,
    text: Rope,
    model: Option<SourceModel>,
    /// Form currently shown in the designer.
    current_form: Option<String>,
    config: SyncConfig,
    /// Set when text changed without an immediate reparse.
    dirty: bool,
}

impl SyncEngine {
    /// Parse and build `text`, diffing it against nothing.
    pub fn from_text(
        file_name: &str,
        text: &str,
        config: SyncConfig,
    ) -> Result<(Self, SyncUpdate), SyncError> {
        let mut engine = Self {
            file_name: file_name.to_string(),
            text: Rope::from_str(text),
            model: None,
            current_form: None,
            config,
            dirty: false,
        };
        let update = engine.reparse()?;
        Ok((engine, update))
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn text(&self) -> String {
        self.text.to_string()
    }

    pub fn model(&self) -> Option<&SourceModel> {
        self.model.as_ref()
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn reparse_delay(&self) -> Duration {
        Duration::from_millis(self.config.reparse_delay_ms)
    }

    // ─── Text → Designer direction ──────────────────────────────────────

    /// Replace the whole text and reparse. On a parse error the previous
    /// model stays current.
    pub fn set_text(&mut self, text: &str) -> Result<SyncUpdate, SyncError> {
        self.text = Rope::from_str(text);
        self.reparse()
    }

    /// Mirror a host edit given in character offsets. Returns an update
    /// when the change triggers an immediate reparse.
    pub fn apply_text_change(
        &mut self,
        start_char: usize,
        removed_chars: usize,
        inserted: &str,
    ) -> Result<Option<SyncUpdate>, SyncError> {
        let len = self.text.len_chars();
        let start = start_char.min(len);
        let end = start.saturating_add(removed_chars).min(len);
        self.text.remove(start..end);
        self.text.insert(start, inserted);

        let immediate = (self.config.update_on_enter && inserted.contains('\n'))
            || (self.config.update_on_semicolon && inserted.contains(';'));
        if immediate {
            self.reparse().map(Some)
        } else {
            self.dirty = true;
            Ok(None)
        }
    }

    /// Reparse if a debounced change is pending.
    pub fn flush(&mut self) -> Result<Option<SyncUpdate>, SyncError> {
        if self.dirty {
            self.reparse().map(Some)
        } else {
            Ok(None)
        }
    }

    fn reparse(&mut self) -> Result<SyncUpdate, SyncError> {
        self.dirty = false;
        let text = self.text.to_string();
        let output = match build_source(&text, &self.file_name) {
            Ok(output) => output,
            Err(err) => {
                log::warn!("{}: {err}", self.file_name);
                return Err(err.into());
            }
        };

        let Diff { forms, diagnostics } = diff_models(self.model.as_ref(), &output.model);
        let mut all = output.diagnostics;
        all.extend(diagnostics);
        self.model = Some(output.model);

        Ok(SyncUpdate {
            forms,
            diagnostics: all,
        })
    }

    /// Forms declared in the current model.
    pub fn form_names(&self) -> Vec<String> {
        match &self.model {
            Some(model) => diff_models(None, model).forms.form_names(),
            None => Vec::new(),
        }
    }

    /// Show `name` in the designer: returns the whole form as created.
    pub fn open_form(&mut self, name: &str) -> Result<FormChange, SyncError> {
        let model = self.model.as_ref().ok_or(SyncError::NoModel)?;
        let view = diff_models(None, model).forms.form_update(name);
        self.current_form = Some(name.to_string());
        Ok(view)
    }

    pub fn current_form(&self) -> Option<&str> {
        self.current_form.as_deref()
    }

    /// The `update` message for the open form, if anything changed in it.
    pub fn outbound_update(&self, forms: &Forms) -> Result<Option<String>, SyncError> {
        let Some(form) = &self.current_form else {
            return Ok(None);
        };
        let change = forms.form_update(form);
        if change.is_empty() {
            return Ok(None);
        }
        let json = UpdateMessage::new(&change, &self.file_name)
            .to_json()
            .map_err(ProtocolError::from)?;
        Ok(Some(json))
    }

    // ─── Designer → Text direction ──────────────────────────────────────

    /// Decode an inbound designer message and compute its edits.
    pub fn handle_message(&self, json: &str) -> Result<Vec<TextEdit>, SyncError> {
        let (file_name, request) = DesignerRequest::decode(json)?;
        if !file_name.is_empty() && file_name != self.file_name {
            log::debug!(
                "message for `{file_name}` handled by `{}`",
                self.file_name
            );
        }
        self.handle_request(&request)
    }

    pub fn handle_request(&self, request: &DesignerRequest) -> Result<Vec<TextEdit>, SyncError> {
        let model = self.model.as_ref().ok_or(SyncError::NoModel)?;
        let mut edits = Vec::new();

        match request {
            DesignerRequest::NewComponent(msg) => {
                edits.extend(insert_component(model, &msg.to_request())?);
            }
            DesignerRequest::ComponentsChanges(changes) => {
                for change in changes {
                    edits.extend(change_property(
                        model,
                        &change.component,
                        &change.property,
                        &value_text(&change.value),
                    )?);
                }
            }
            DesignerRequest::DeleteComponent(targets) => {
                let mut seen: HashSet<Range> = HashSet::new();
                for target in targets {
                    for edit in delete_component(model, &target.fullname)? {
                        if seen.insert(edit.range()) {
                            edits.push(edit);
                        }
                    }
                }
            }
        }

        if edits.is_empty() {
            log::warn!("{}: designer request produced no edits", self.file_name);
            return Err(PatchError::EmptyRequest.into());
        }
        Ok(edits)
    }

    /// Convert a byte-offset edit to character offsets in the live text.
    pub fn char_range(&self, edit: &TextEdit) -> std::ops::Range<usize> {
        let len = self.text.len_bytes();
        self.text.byte_to_char(edit.pos.min(len))..self.text.byte_to_char(edit.end.min(len))
    }

    /// Apply edits to the live text and reparse.
    pub fn apply_edits(&mut self, edits: &[TextEdit]) -> Result<SyncUpdate, SyncError> {
        let text = apply_edits(&self.text.to_string(), edits);
        self.set_text(&text)
    }
}

//! Custom-template storage backed by a single JSON file.
//!
//! Built-in templates are compiled in and never written to disk; only custom
//! templates are persisted, exported, and imported.

use super::{built_in_templates, SessionTemplate};
use crate::error::StoreError;
use crate::persist::{read_json, write_json_atomic};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// On-disk schema version for the templates file.
const TEMPLATES_FILE_VERSION: u32 = 1;

#[derive(Serialize)]
struct TemplatesFileRef<'a> {
    version: u32,
    templates: &'a [SessionTemplate],
}

#[derive(Deserialize)]
struct TemplatesFile {
    version: u32,
    #[serde(default)]
    templates: Vec<SessionTemplate>,
}

/// Built-in templates plus the user's custom ones.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    path: Option<PathBuf>,
    built_ins: Vec<SessionTemplate>,
    custom: Vec<SessionTemplate>,
}

impl TemplateStore {
    /// Open the store at `path`. A missing file starts empty; a malformed one
    /// is an error rather than being silently replaced.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let custom = match read_json::<TemplatesFile>(&path)? {
            None => Vec::new(),
            Some(file) if file.version != TEMPLATES_FILE_VERSION => {
                return Err(StoreError::Invalid(format!(
                    "unsupported templates file version {} in {}",
                    file.version,
                    path.display()
                )));
            }
            Some(file) => file
                .templates
                .into_iter()
                .map(|mut template| {
                    template.built_in = false;
                    template
                })
                .collect(),
        };
        debug!(path = %path.display(), count = custom.len(), "loaded custom templates");
        Ok(Self {
            path: Some(path),
            built_ins: built_in_templates(),
            custom,
        })
    }

    /// A store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            built_ins: built_in_templates(),
            custom: Vec::new(),
        }
    }

    /// Built-ins first, then custom templates in insertion order.
    pub fn all(&self) -> Vec<SessionTemplate> {
        self.built_ins
            .iter()
            .chain(self.custom.iter())
            .cloned()
            .collect()
    }

    pub fn custom(&self) -> &[SessionTemplate] {
        &self.custom
    }

    /// Look a template up by id, falling back to an exact name match.
    pub fn find(&self, id_or_name: &str) -> Option<&SessionTemplate> {
        let mut candidates = self.built_ins.iter().chain(self.custom.iter());
        candidates
            .clone()
            .find(|t| t.id == id_or_name)
            .or_else(|| candidates.find(|t| t.name == id_or_name))
    }

    /// Add a custom template. A missing or clashing id is replaced.
    pub fn add(&mut self, mut template: SessionTemplate) -> Result<SessionTemplate, StoreError> {
        template.built_in = false;
        if template.id.is_empty() || self.contains_id(&template.id, &self.custom) {
            template.id = self.fresh_id(&self.custom);
        }
        let mut next = self.custom.clone();
        next.push(template.clone());
        self.commit(next)?;
        info!(id = %template.id, name = %template.name, "added template");
        Ok(template)
    }

    /// Replace the custom template with the same id.
    pub fn update(&mut self, mut template: SessionTemplate) -> Result<(), StoreError> {
        if self.is_built_in(&template.id) {
            return Err(StoreError::Invalid(format!(
                "built-in template '{}' cannot be modified",
                template.name
            )));
        }
        let mut next = self.custom.clone();
        let slot = next
            .iter_mut()
            .find(|t| t.id == template.id)
            .ok_or_else(|| unknown_template(&template.id))?;
        template.built_in = false;
        *slot = template;
        self.commit(next)
    }

    /// Delete a custom template and return it.
    pub fn delete(&mut self, id: &str) -> Result<SessionTemplate, StoreError> {
        if self.is_built_in(id) {
            return Err(StoreError::Invalid(format!(
                "built-in template '{id}' cannot be deleted"
            )));
        }
        let index = self
            .custom
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| unknown_template(id))?;
        let mut next = self.custom.clone();
        let removed = next.remove(index);
        self.commit(next)?;
        info!(id, name = %removed.name, "deleted template");
        Ok(removed)
    }

    /// Copy any template (built-in or custom) into a new custom one named
    /// `"<name> Copy"`.
    pub fn duplicate(&mut self, id: &str) -> Result<SessionTemplate, StoreError> {
        let mut copy = self.find(id).cloned().ok_or_else(|| unknown_template(id))?;
        copy.id = self.fresh_id(&self.custom);
        copy.name = format!("{} Copy", copy.name);
        copy.built_in = false;
        let mut next = self.custom.clone();
        next.push(copy.clone());
        self.commit(next)?;
        Ok(copy)
    }

    /// Serialize the custom templates as a JSON array.
    pub fn export(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(&self.custom)?)
    }

    /// Append templates from a JSON array produced by [`export`](Self::export).
    ///
    /// Every imported template gets a fresh id and loses its built-in flag.
    /// Malformed input or a failed save imports nothing.
    pub fn import(&mut self, json: &str) -> Result<Vec<SessionTemplate>, StoreError> {
        let incoming: Vec<SessionTemplate> = serde_json::from_str(json)?;
        let mut next = self.custom.clone();
        let mut imported = Vec::with_capacity(incoming.len());
        for mut template in incoming {
            template.id = self.fresh_id(&next);
            template.built_in = false;
            next.push(template.clone());
            imported.push(template);
        }
        self.commit(next)?;
        info!(count = imported.len(), "imported templates");
        Ok(imported)
    }

    fn is_built_in(&self, id: &str) -> bool {
        self.built_ins.iter().any(|t| t.id == id)
    }

    fn contains_id(&self, id: &str, custom: &[SessionTemplate]) -> bool {
        self.is_built_in(id) || custom.iter().any(|t| t.id == id)
    }

    fn fresh_id(&self, custom: &[SessionTemplate]) -> String {
        loop {
            let id = generate_template_id();
            if !self.contains_id(&id, custom) {
                return id;
            }
        }
    }

    /// Persist `next`, and only then make it the in-memory list.
    fn commit(&mut self, next: Vec<SessionTemplate>) -> Result<(), StoreError> {
        if let Some(path) = &self.path {
            write_json_atomic(
                path,
                &TemplatesFileRef {
                    version: TEMPLATES_FILE_VERSION,
                    templates: &next,
                },
            )?;
        }
        self.custom = next;
        Ok(())
    }
}

fn unknown_template(id: &str) -> StoreError {
    StoreError::Invalid(format!("unknown template '{id}'"))
}

/// Generate an opaque hex template id (`xxxx-xxxx-xxxx-xxxx`).
pub fn generate_template_id() -> String {
    let mut bytes = [0u8; 8];
    OsRng.fill_bytes(&mut bytes);
    let hex = format!("{:016x}", u64::from_be_bytes(bytes));
    format!(
        "{}-{}-{}-{}",
        &hex[0..4],
        &hex[4..8],
        &hex[8..12],
        &hex[12..16]
    )
}

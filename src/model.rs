//! Models: the containers fields are bound into.
//!
//! Binding a [`Field`] to a [`Model`] gives it a name and a [`FieldId`] and
//! makes it usable by the lowering. A model also owns named constraint
//! blocks, each of which can be switched on and off.

use log::debug;

use crate::error::{Error, Result};
use crate::field::{Field, FieldId, FieldType};
use crate::scope::ConstraintScope;

/// A named constraint scope owned by a [`Model`].
#[derive(Debug, Clone)]
pub struct ConstraintBlock {
    name: String,
    scope: ConstraintScope,
    enabled: bool,
}

impl ConstraintBlock {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> &ConstraintScope {
        &self.scope
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[derive(Debug)]
pub struct Model {
    name: String,
    fields: Vec<Field>,
    blocks: Vec<ConstraintBlock>,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            blocks: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare a field and bind it in one step.
    pub fn field(&mut self, name: &str, ty: FieldType, is_random: bool) -> Result<Field> {
        let field = Field::new(ty, is_random)?;
        self.bind(name, &field)?;
        Ok(field)
    }

    /// Bind an existing field under `name`. A field can only be bound once.
    pub fn bind(&mut self, name: &str, field: &Field) -> Result<FieldId> {
        if self.field_by_name(name).is_some() {
            return Err(Error::DuplicateField(name.to_string()));
        }
        let id = FieldId::new(self.fields.len() as u32);
        field.bind(id, name)?;
        self.fields.push(field.clone());
        Ok(id)
    }

    /// Bound fields, in bind order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == Some(name))
    }

    pub fn field_by_id(&self, id: FieldId) -> Option<&Field> {
        self.fields.get(id.index() as usize)
    }

    /// Add a named constraint block, enabled. A block with the same name
    /// replaces the earlier one.
    pub fn constraint(&mut self, name: impl Into<String>, scope: ConstraintScope) {
        let name = name.into();
        debug!("constraint {}.{}: {} constraints", self.name, name, scope.len());
        let block = ConstraintBlock {
            name,
            scope,
            enabled: true,
        };
        match self.blocks.iter_mut().find(|b| b.name == block.name) {
            Some(existing) => *existing = block,
            None => self.blocks.push(block),
        }
    }

    /// Add a named constraint block populated by `build`.
    ///
    /// Nothing is added if `build` fails.
    pub fn constraint_with(
        &mut self,
        name: impl Into<String>,
        build: impl FnOnce(&mut ConstraintScope) -> Result<()>,
    ) -> Result<()> {
        let mut scope = ConstraintScope::new();
        build(&mut scope)?;
        self.constraint(name, scope);
        Ok(())
    }

    pub fn set_constraint_mode(&mut self, name: &str, enabled: bool) -> Result<()> {
        let block = self
            .blocks
            .iter_mut()
            .find(|b| b.name == name)
            .ok_or_else(|| Error::UnknownConstraint(name.to_string()))?;
        block.enabled = enabled;
        Ok(())
    }

    pub fn constraint_mode(&self, name: &str) -> Result<bool> {
        self.blocks
            .iter()
            .find(|b| b.name == name)
            .map(|b| b.enabled)
            .ok_or_else(|| Error::UnknownConstraint(name.to_string()))
    }

    pub fn blocks(&self) -> &[ConstraintBlock] {
        &self.blocks
    }

    pub fn enabled_scopes(&self) -> impl Iterator<Item = &ConstraintScope> + '_ {
        self.blocks.iter().filter(|b| b.enabled).map(|b| &b.scope)
    }
}

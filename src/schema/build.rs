//! Build arguments: the trailing arguments of schema constructors.
//!
//! A [`BuildArg`] is either a child schema or an option. Options are trait objects,
//! so every backend can ship its own (see `drivers::gemini::options`) while the
//! builder only ever matches on the two tags.

use super::{BackendId, Schema, SchemaKind};
use crate::{Error, ErrorContext, Result};
use std::fmt;

/// Which of the two build-argument cases a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildArgType {
    /// Contributes a fully built child schema.
    Schema,
    /// Mutates the schema under construction.
    Option,
}

impl BuildArgType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildArgType::Schema => "schema",
            BuildArgType::Option => "option",
        }
    }
}

impl fmt::Display for BuildArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mutation applied to the schema currently being built.
pub trait SchemaOption: Send + Sync + fmt::Debug {
    fn apply(&self, schema: &mut Schema);
}

/// One trailing argument of a schema constructor.
#[derive(Debug)]
pub enum BuildArg {
    Schema(Schema),
    Option(Box<dyn SchemaOption>),
}

impl BuildArg {
    pub fn option(option: impl SchemaOption + 'static) -> Self {
        BuildArg::Option(Box::new(option))
    }

    pub fn build_arg_type(&self) -> BuildArgType {
        match self {
            BuildArg::Schema(_) => BuildArgType::Schema,
            BuildArg::Option(_) => BuildArgType::Option,
        }
    }
}

impl From<Schema> for BuildArg {
    fn from(schema: Schema) -> Self {
        BuildArg::Schema(schema)
    }
}

/// Sets the description of the node under construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description(pub String);

impl SchemaOption for Description {
    fn apply(&self, schema: &mut Schema) {
        schema.set_description(self.0.clone());
    }
}

/// Marks the node under construction as required by its parent object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Required;

impl SchemaOption for Required {
    fn apply(&self, schema: &mut Schema) {
        schema.set_required(true);
    }
}

pub fn description(text: impl Into<String>) -> BuildArg {
    BuildArg::option(Description(text.into()))
}

pub fn required() -> BuildArg {
    BuildArg::option(Required)
}

impl Schema {
    /// Allocate a node and fold `args` into it left to right.
    pub(crate) fn build(
        backend: BackendId,
        kind: SchemaKind,
        name: impl Into<String>,
        args: Vec<BuildArg>,
    ) -> Result<Schema> {
        let mut schema = Schema::new(backend, kind, name);
        for arg in args {
            schema.apply_build_arg(arg)?;
        }
        Ok(schema)
    }

    fn apply_build_arg(&mut self, arg: BuildArg) -> Result<()> {
        match arg {
            BuildArg::Option(option) => {
                option.apply(self);
                Ok(())
            }
            BuildArg::Schema(child) if self.kind().is_primitive() => {
                Err(Error::configuration_with_context(
                    format!(
                        "{} schema '{}' accepts only option arguments, got schema '{}'",
                        self.kind(),
                        self.name(),
                        child.name()
                    ),
                    ErrorContext::new()
                        .with_field_path(child.name().to_string())
                        .with_source("schema_builder"),
                ))
            }
            BuildArg::Schema(child) if self.kind() == SchemaKind::Object => {
                self.insert_property(child)
            }
            BuildArg::Schema(child) => self.set_items(child),
        }
    }
}

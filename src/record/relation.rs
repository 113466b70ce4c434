//! Convention-based relationship resolution.
//!
//! An accessor that names an attribute is a "belongs to" relation whose
//! foreign key is that attribute (`job` on a `JobPart`). Any other accessor is a
//! plural "has many" relation filtered on the owner's property name
//! (`jobParts` on a `Job` finds `JobPart`s whose `@job` is the job's key).

use super::Record;
use crate::error::Result;
use crate::naming::{Inflector, TypeName};
use crate::query::Builder;
use tracing::warn;

/// How an accessor maps onto a related type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relation {
    BelongsTo {
        related_type: TypeName,
        foreign_key: String,
    },
    HasMany {
        related_type: TypeName,
        foreign_key: String,
    },
}

/// The result of following a relation.
#[derive(Debug, Clone)]
pub enum Related {
    One(Option<Record>),
    /// An unexecuted query over the related type.
    Many(Builder),
}

impl Related {
    pub fn into_one(self) -> Option<Record> {
        match self {
            Related::One(record) => record,
            Related::Many(_) => None,
        }
    }

    pub fn into_many(self) -> Option<Builder> {
        match self {
            Related::Many(builder) => Some(builder),
            Related::One(_) => None,
        }
    }
}

pub struct RelationshipResolver<'a> {
    inflector: &'a dyn Inflector,
}

impl<'a> RelationshipResolver<'a> {
    pub fn new(inflector: &'a dyn Inflector) -> Self {
        Self { inflector }
    }

    pub fn resolve(&self, record: &Record, accessor: &str) -> Result<Relation> {
        if record.has_attribute(accessor) {
            return Ok(Relation::BelongsTo {
                related_type: TypeName::from_property(accessor)?,
                foreign_key: accessor.to_string(),
            });
        }

        if self.inflector.is_ambiguous(accessor) {
            warn!(accessor, "Ambiguous plural, relation may resolve to the wrong type");
        }
        let singular = self.inflector.singular(accessor);

        Ok(Relation::HasMany {
            related_type: TypeName::from_property(&singular)?,
            foreign_key: record.type_name().property_name(),
        })
    }
}

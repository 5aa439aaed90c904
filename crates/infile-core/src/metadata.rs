//! Static schema descriptors.
//!
//! Every loadable type publishes one `&'static EntitySchema` describing its
//! table, columns, relationships, embedded values and identity. Descriptors
//! are plain data built with `const fn` builders, so they can live in
//! `static` items next to the type they describe:
//!
//! ```
//! use infile_core::{ColumnInfo, EntitySchema, IdentityInfo};
//!
//! static CUSTOMER: EntitySchema = EntitySchema::new("Customer")
//!     .table("customer")
//!     .identity(IdentityInfo::auto("id"))
//!     .columns(&[ColumnInfo::new("last_seen_on")]);
//!
//! assert_eq!(CUSTOMER.table, Some("customer"));
//! ```
//!
//! Relationships point at their target through a `fn() -> &'static EntitySchema`
//! so the whole reachable type universe can be walked without instances.

/// How an identity value comes into existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Generation {
    /// The caller assigns the identity.
    #[default]
    Assigned,
    /// The loader assigns the identity from a client-side sequence when unset.
    Auto,
    /// The identity is copied from a related entity (shared primary key).
    Foreign,
}

/// The identity (primary key) of an entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityInfo {
    /// Field holding the identity value.
    pub field: &'static str,
    /// Column name override; defaults to the field name.
    pub column: Option<&'static str>,
    /// Generation strategy.
    pub generation: Generation,
}

impl IdentityInfo {
    /// An identity assigned by the caller.
    pub const fn assigned(field: &'static str) -> Self {
        Self {
            field,
            column: None,
            generation: Generation::Assigned,
        }
    }

    /// An identity generated by the loader when unset.
    pub const fn auto(field: &'static str) -> Self {
        Self {
            field,
            column: None,
            generation: Generation::Auto,
        }
    }

    /// An identity shared with a related entity.
    pub const fn foreign(field: &'static str) -> Self {
        Self {
            field,
            column: None,
            generation: Generation::Foreign,
        }
    }

    /// Set the column name.
    pub const fn column(mut self, column: &'static str) -> Self {
        self.column = Some(column);
        self
    }

    /// The column this identity is stored in.
    pub const fn column_name(&self) -> &'static str {
        match self.column {
            Some(column) => column,
            None => self.field,
        }
    }
}

/// A scalar column of an entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnInfo {
    /// Database column name.
    pub column: &'static str,
    /// Field the value is read from.
    pub field: &'static str,
    /// Table override; `None` means the entity's primary table.
    pub table: Option<&'static str>,
    /// Tabs inside the value are substituted instead of escaped.
    pub free_text: bool,
}

impl ColumnInfo {
    /// A column whose field has the same name.
    pub const fn new(column: &'static str) -> Self {
        Self {
            column,
            field: column,
            table: None,
            free_text: false,
        }
    }

    /// Read the value from a differently named field.
    pub const fn field(mut self, field: &'static str) -> Self {
        self.field = field;
        self
    }

    /// Store this column in another (secondary) table.
    pub const fn table(mut self, table: &'static str) -> Self {
        self.table = Some(table);
        self
    }

    /// Mark the column as free text (tabs replaced by commas).
    pub const fn free_text(mut self) -> Self {
        self.free_text = true;
        self
    }

    /// Whether this column belongs to `table`, given the owner's primary table.
    pub fn belongs_to(&self, table: &str, primary: bool) -> bool {
        match self.table {
            Some(declared) => declared == table,
            None => primary,
        }
    }
}

/// A second table holding more columns of the same logical entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecondaryTableInfo {
    /// Table name.
    pub name: &'static str,
    /// Primary-key join columns; exactly one is supported.
    pub pk_join_columns: &'static [&'static str],
}

impl SecondaryTableInfo {
    /// Create a secondary table joined on `pk_join_columns`.
    pub const fn new(name: &'static str, pk_join_columns: &'static [&'static str]) -> Self {
        Self {
            name,
            pk_join_columns,
        }
    }
}

/// The type of relationship between two entity types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipKind {
    /// One-to-one: `Customer` has one `Contact`.
    OneToOne,
    /// Many-to-one: many `Product`s belong to one `Customer`.
    ManyToOne,
    /// One-to-many: one `Customer` has many `Product`s.
    OneToMany,
}

/// Insertion ordering implied by a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dependency {
    /// The target must be persisted before the owner.
    Child,
    /// The target receives the owner's key and is persisted after it.
    Parent,
}

/// Metadata about a relationship between entity types.
#[derive(Debug, Clone, Copy)]
pub struct RelationshipInfo {
    /// Name of the relationship accessor.
    pub name: &'static str,
    /// Kind of relationship.
    pub kind: RelationshipKind,
    /// Foreign key column written on the owner's row (ManyToOne / owning OneToOne).
    pub join_column: Option<&'static str>,
    /// The two sides share a primary key (OneToOne).
    pub primary_key_join: bool,
    /// Field on the target that receives the owner's key.
    pub mapped_by: Option<&'static str>,
    /// Function pointer returning the target type's schema.
    pub target: fn() -> &'static EntitySchema,
}

impl RelationshipInfo {
    /// Create a relationship with required fields.
    pub const fn new(
        name: &'static str,
        kind: RelationshipKind,
        target: fn() -> &'static EntitySchema,
    ) -> Self {
        Self {
            name,
            kind,
            join_column: None,
            primary_key_join: false,
            mapped_by: None,
            target,
        }
    }

    /// Many-to-one relationship.
    pub const fn many_to_one(name: &'static str, target: fn() -> &'static EntitySchema) -> Self {
        Self::new(name, RelationshipKind::ManyToOne, target)
    }

    /// One-to-many relationship.
    pub const fn one_to_many(name: &'static str, target: fn() -> &'static EntitySchema) -> Self {
        Self::new(name, RelationshipKind::OneToMany, target)
    }

    /// One-to-one relationship.
    pub const fn one_to_one(name: &'static str, target: fn() -> &'static EntitySchema) -> Self {
        Self::new(name, RelationshipKind::OneToOne, target)
    }

    /// Set the foreign key column written on the owner's row.
    pub const fn join_column(mut self, column: &'static str) -> Self {
        self.join_column = Some(column);
        self
    }

    /// Mark a one-to-one as sharing the owner's primary key.
    pub const fn primary_key_join(mut self) -> Self {
        self.primary_key_join = true;
        self
    }

    /// Set the field on the target that receives the owner's key.
    pub const fn mapped_by(mut self, field: &'static str) -> Self {
        self.mapped_by = Some(field);
        self
    }

    /// The insertion ordering this relationship imposes.
    pub const fn dependency(&self) -> Dependency {
        match self.kind {
            RelationshipKind::ManyToOne => Dependency::Child,
            RelationshipKind::OneToMany => Dependency::Parent,
            RelationshipKind::OneToOne if self.primary_key_join => Dependency::Parent,
            RelationshipKind::OneToOne => Dependency::Child,
        }
    }

    /// The target type's schema.
    pub fn target_schema(&self) -> &'static EntitySchema {
        (self.target)()
    }
}

impl PartialEq for RelationshipInfo {
    fn eq(&self, other: &Self) -> bool {
        // `target` is ignored: function-pointer equality is not stable across codegen units.
        self.name == other.name
            && self.kind == other.kind
            && self.join_column == other.join_column
            && self.primary_key_join == other.primary_key_join
            && self.mapped_by == other.mapped_by
    }
}

impl Eq for RelationshipInfo {}

/// A value object whose columns are flattened into the owner's row.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedInfo {
    /// Field holding the embedded value.
    pub field: &'static str,
    /// Function pointer returning the embedded type's schema.
    pub target: fn() -> &'static EntitySchema,
}

impl EmbeddedInfo {
    /// Create an embedded field.
    pub const fn new(field: &'static str, target: fn() -> &'static EntitySchema) -> Self {
        Self { field, target }
    }

    /// The embedded type's schema.
    pub fn target_schema(&self) -> &'static EntitySchema {
        (self.target)()
    }
}

/// Everything the loaders need to know about one type.
#[derive(Debug, Clone, Copy)]
pub struct EntitySchema {
    /// Type name; unique per loadable type.
    pub entity: &'static str,
    /// Primary table; `None` for embeddable value types.
    pub table: Option<&'static str>,
    /// Secondary tables, in declaration order.
    pub secondary_tables: &'static [SecondaryTableInfo],
    /// Scalar columns, in declaration order.
    pub columns: &'static [ColumnInfo],
    /// Relationships, in declaration order.
    pub relationships: &'static [RelationshipInfo],
    /// Embedded values, flattened after the declared columns.
    pub embedded: &'static [EmbeddedInfo],
    /// Identity, if the type has one.
    pub identity: Option<IdentityInfo>,
}

impl EntitySchema {
    /// Create an empty schema for `entity`.
    pub const fn new(entity: &'static str) -> Self {
        Self {
            entity,
            table: None,
            secondary_tables: &[],
            columns: &[],
            relationships: &[],
            embedded: &[],
            identity: None,
        }
    }

    /// Set the primary table.
    pub const fn table(mut self, table: &'static str) -> Self {
        self.table = Some(table);
        self
    }

    /// Set the secondary tables.
    pub const fn secondary_tables(mut self, tables: &'static [SecondaryTableInfo]) -> Self {
        self.secondary_tables = tables;
        self
    }

    /// Set the scalar columns.
    pub const fn columns(mut self, columns: &'static [ColumnInfo]) -> Self {
        self.columns = columns;
        self
    }

    /// Set the relationships.
    pub const fn relationships(mut self, relationships: &'static [RelationshipInfo]) -> Self {
        self.relationships = relationships;
        self
    }

    /// Set the embedded values.
    pub const fn embedded(mut self, embedded: &'static [EmbeddedInfo]) -> Self {
        self.embedded = embedded;
        self
    }

    /// Set the identity.
    pub const fn identity(mut self, identity: IdentityInfo) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Find a relationship by accessor name.
    pub fn relationship(&self, name: &str) -> Option<&'static RelationshipInfo> {
        self.relationships.iter().find(|r| r.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static TEAM: EntitySchema = EntitySchema::new("Team")
        .table("team")
        .identity(IdentityInfo::auto("id"));

    fn team() -> &'static EntitySchema {
        &TEAM
    }

    #[test]
    fn dependency_follows_kind_and_key_sharing() {
        assert_eq!(
            RelationshipInfo::many_to_one("team", team).dependency(),
            Dependency::Child
        );
        assert_eq!(
            RelationshipInfo::one_to_many("heroes", team).dependency(),
            Dependency::Parent
        );
        assert_eq!(
            RelationshipInfo::one_to_one("badge", team).dependency(),
            Dependency::Child
        );
        assert_eq!(
            RelationshipInfo::one_to_one("profile", team)
                .primary_key_join()
                .dependency(),
            Dependency::Parent
        );
    }

    #[test]
    fn identity_column_defaults_to_field() {
        assert_eq!(IdentityInfo::auto("id").column_name(), "id");
        assert_eq!(
            IdentityInfo::foreign("id").column("customer_id").column_name(),
            "customer_id"
        );
    }

    #[test]
    fn column_table_membership() {
        let plain = ColumnInfo::new("name");
        let phone = ColumnInfo::new("phone").table("contact_phone");
        assert!(plain.belongs_to("contact", true));
        assert!(!plain.belongs_to("contact_phone", false));
        assert!(phone.belongs_to("contact_phone", false));
        assert!(!phone.belongs_to("contact", true));
    }

    #[test]
    fn relationship_lookup_and_target() {
        static HERO: EntitySchema = EntitySchema::new("Hero")
            .table("hero")
            .relationships(&[RelationshipInfo::many_to_one("team", team).join_column("team_id")]);
        let rel = HERO.relationship("team").unwrap();
        assert_eq!(rel.join_column, Some("team_id"));
        assert_eq!(rel.target_schema().entity, "Team");
        assert!(HERO.relationship("missing").is_none());
    }
}

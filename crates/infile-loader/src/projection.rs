//! Schema projections: which columns a table receives and where their values come from.
//!
//! A [`SchemaProjection`] is derived once per (type, table) by the
//! [`ProjectionBuilder`] and then drives row rendering and the bulk-load
//! statement for that table.

use infile_buffer::InfileRow;
use infile_core::entity::{Entity, Related, RowFields, borrow_entity};
use infile_core::error::{AccessorErrorKind, Error, Result, SchemaErrorKind};
use infile_core::identifiers::{check_column_name, quote_ident_mysql};
use infile_core::inspector::MetadataInspector;
use infile_core::metadata::{EntitySchema, Generation, RelationshipKind, SecondaryTableInfo};
use infile_core::value::Value;
use std::collections::HashSet;

/// Where a projected column reads its value from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSource {
    /// A scalar field, possibly nested inside embedded values.
    Field {
        /// Embedded fields to walk through, outermost first.
        path: Vec<&'static str>,
        /// Field name on the innermost value.
        field: &'static str,
        /// Substitute tabs instead of writing them verbatim.
        free_text: bool,
    },
    /// The identity of the entity behind an owning relationship.
    JoinColumn {
        /// Relationship accessor name.
        relation: &'static str,
    },
}

/// One column of a projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedColumn {
    /// Database column name.
    pub name: &'static str,
    /// Value source.
    pub source: ColumnSource,
}

/// The identity column of a projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectedIdentity {
    /// Column name.
    pub column: &'static str,
    /// Field holding the value.
    pub field: &'static str,
}

/// Column layout of one table of one entity type.
#[derive(Debug, Clone)]
pub struct SchemaProjection {
    entity: &'static str,
    table: &'static str,
    secondary: bool,
    columns: Vec<ProjectedColumn>,
    identity: ProjectedIdentity,
    auto_generate: bool,
    statement: String,
}

impl SchemaProjection {
    /// Entity type name.
    pub fn entity(&self) -> &'static str {
        self.entity
    }

    /// Target table.
    pub fn table(&self) -> &'static str {
        self.table
    }

    /// Whether this projects a secondary table.
    pub fn is_secondary(&self) -> bool {
        self.secondary
    }

    /// Columns in row order; the identity comes first.
    pub fn columns(&self) -> &[ProjectedColumn] {
        &self.columns
    }

    /// Column names in row order.
    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    /// The identity column.
    pub fn identity(&self) -> ProjectedIdentity {
        self.identity
    }

    /// Whether unset identities are generated client-side.
    pub fn auto_generate(&self) -> bool {
        self.auto_generate
    }

    /// The `LOAD DATA LOCAL INFILE` statement for this table.
    pub fn statement(&self) -> &str {
        &self.statement
    }

    /// Encode `entity` as one row.
    pub fn render_row(&self, entity: &dyn Entity, row: &mut InfileRow<'_>) -> Result<()> {
        for column in &self.columns {
            match &column.source {
                ColumnSource::Field {
                    path,
                    field,
                    free_text,
                } => match read_path(entity, path, field)? {
                    Value::Text(text) if *free_text => {
                        row.append_free_text(&text)?;
                    }
                    value => {
                        row.append_value(&value)?;
                    }
                },
                ColumnSource::JoinColumn { relation } => {
                    let value = join_value(entity, relation)?;
                    row.append_value(&value)?;
                }
            }
        }
        Ok(())
    }
}

fn read_path<F: RowFields + ?Sized>(
    fields: &F,
    path: &[&'static str],
    field: &str,
) -> Result<Value> {
    match path.split_first() {
        None => fields.field_value(field),
        Some((head, rest)) => match fields.embedded(head)? {
            Some(inner) => read_path(inner, rest, field),
            None => Ok(Value::Null),
        },
    }
}

fn join_value(entity: &dyn Entity, relation: &str) -> Result<Value> {
    match entity.related(relation)? {
        Related::None => Ok(Value::Null),
        Related::One(target) => {
            let target_ref = borrow_entity(&target, relation)?;
            target_ref.identity()
        }
        Related::Many(_) => Err(Error::accessor(
            AccessorErrorKind::UnknownRelation,
            entity.type_name(),
            relation,
        )),
    }
}

/// Derives a [`SchemaProjection`] from schema descriptors.
///
/// ```
/// use infile_core::{ColumnInfo, EntitySchema, IdentityInfo, SchemaInspector};
/// use infile_loader::ProjectionBuilder;
///
/// static CUSTOMER: EntitySchema = EntitySchema::new("Customer")
///     .table("customer")
///     .identity(IdentityInfo::auto("id"))
///     .columns(&[ColumnInfo::new("last_seen_on")]);
///
/// let projection = ProjectionBuilder::new(&SchemaInspector, &CUSTOMER).build()?;
/// assert_eq!(
///     projection.statement(),
///     "LOAD DATA LOCAL INFILE 'stream' INTO TABLE `customer` (`id`, `last_seen_on`)"
/// );
/// # Ok::<(), infile_core::Error>(())
/// ```
pub struct ProjectionBuilder<'a, I: MetadataInspector + ?Sized> {
    inspector: &'a I,
    schema: &'static EntitySchema,
    table_name: Option<&'static str>,
    secondary: Option<&'static SecondaryTableInfo>,
}

impl<'a, I: MetadataInspector + ?Sized> ProjectionBuilder<'a, I> {
    /// Start a projection of `schema`'s primary table.
    pub fn new(inspector: &'a I, schema: &'static EntitySchema) -> Self {
        Self {
            inspector,
            schema,
            table_name: None,
            secondary: None,
        }
    }

    /// Load into a differently named table.
    #[must_use]
    pub fn with_table_name(mut self, table: &'static str) -> Self {
        self.table_name = Some(table);
        self
    }

    /// Project a secondary table instead of the primary one.
    #[must_use]
    pub fn using_secondary_table(mut self, secondary: &'static SecondaryTableInfo) -> Self {
        self.secondary = Some(secondary);
        self
    }

    /// Build the projection.
    pub fn build(self) -> Result<SchemaProjection> {
        let schema = self.schema;
        let primary_table = match self.table_name {
            Some(table) => table,
            None => self.inspector.table_name(schema).ok_or_else(|| {
                Error::schema(
                    SchemaErrorKind::MissingTable,
                    schema.entity,
                    "type declares no table",
                )
            })?,
        };
        let table = self.secondary.map_or(primary_table, |s| s.name);

        let identity = self.resolve_identity()?;
        let mut columns = vec![ProjectedColumn {
            name: identity.column,
            source: ColumnSource::Field {
                path: Vec::new(),
                field: identity.field,
                free_text: false,
            },
        }];

        self.collect_columns(schema, table, self.secondary.is_none(), &[], &mut columns);
        if self.secondary.is_none() {
            for embedded in self.inspector.embedded(schema) {
                self.collect_embedded(
                    embedded.target_schema(),
                    primary_table,
                    vec![embedded.field],
                    &mut columns,
                );
            }
            for kind in [RelationshipKind::ManyToOne, RelationshipKind::OneToOne] {
                for relation in self.inspector.relationships(schema, kind, None) {
                    if let Some(join_column) = relation.join_column {
                        columns.push(ProjectedColumn {
                            name: join_column,
                            source: ColumnSource::JoinColumn {
                                relation: relation.name,
                            },
                        });
                    }
                }
            }
        }

        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            check_column_name(schema.entity, column.name)?;
            if !seen.insert(column.name) {
                return Err(Error::schema(
                    SchemaErrorKind::DuplicateColumn,
                    schema.entity,
                    format!("column '{}' is projected twice into '{}'", column.name, table),
                ));
            }
        }

        let auto_generate = self.secondary.is_none()
            && self
                .inspector
                .identity(schema)
                .is_some_and(|id| id.generation == Generation::Auto);
        let statement = load_statement(table, columns.iter().map(|c| c.name));

        Ok(SchemaProjection {
            entity: schema.entity,
            table,
            secondary: self.secondary.is_some(),
            columns,
            identity,
            auto_generate,
            statement,
        })
    }

    fn resolve_identity(&self) -> Result<ProjectedIdentity> {
        let schema = self.schema;
        let identity = self.inspector.identity(schema).ok_or_else(|| {
            Error::schema(
                SchemaErrorKind::MissingIdentity,
                schema.entity,
                "no identity declared",
            )
        })?;
        let column = match self.secondary {
            Some(secondary) => match secondary.pk_join_columns {
                [column] => *column,
                other => {
                    return Err(Error::schema(
                        SchemaErrorKind::JoinColumns,
                        schema.entity,
                        format!(
                            "secondary table '{}' needs exactly one primary key join column, found {}",
                            secondary.name,
                            other.len()
                        ),
                    ));
                }
            },
            None => identity.column_name(),
        };
        Ok(ProjectedIdentity {
            column,
            field: identity.field,
        })
    }

    fn collect_columns(
        &self,
        schema: &'static EntitySchema,
        table: &str,
        primary: bool,
        path: &[&'static str],
        out: &mut Vec<ProjectedColumn>,
    ) {
        for column in self.inspector.columns(schema) {
            if column.belongs_to(table, primary) {
                out.push(ProjectedColumn {
                    name: column.column,
                    source: ColumnSource::Field {
                        path: path.to_vec(),
                        field: column.field,
                        free_text: column.free_text,
                    },
                });
            }
        }
    }

    fn collect_embedded(
        &self,
        schema: &'static EntitySchema,
        table: &str,
        path: Vec<&'static str>,
        out: &mut Vec<ProjectedColumn>,
    ) {
        self.collect_columns(schema, table, true, &path, out);
        for nested in self.inspector.embedded(schema) {
            let mut nested_path = path.clone();
            nested_path.push(nested.field);
            self.collect_embedded(nested.target_schema(), table, nested_path, out);
        }
    }
}

/// Render the bulk-load statement for `table` and `columns`.
pub fn load_statement<'c>(table: &str, columns: impl IntoIterator<Item = &'c str>) -> String {
    let columns: Vec<String> = columns.into_iter().map(quote_ident_mysql).collect();
    format!(
        "LOAD DATA LOCAL INFILE 'stream' INTO TABLE {} ({})",
        quote_ident_mysql(table),
        columns.join(", ")
    )
}

use heck::ToSnakeCase;

/// How a foreign-key column is resolved into its target record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Resolved on demand through `resolve_foreign_targets`.
    Lazy,

    /// Joined into every fetch of the owning table and resolved eagerly.
    Always,
}

/// The SQL type of a column, from the mapping layer's point of view.
///
/// Drivers may store these however they like; the mapping layer only uses
/// the type for definition bookkeeping, not for value coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Bool,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Float,
    Double,
    Decimal,
    Char,
    VarChar,
    Text,
    Blob,
    Date,
    Time,
    DateTime,
    Timestamp,
    Json,
}

/// The foreign table and key a column points at, plus how eagerly the
/// relationship is fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignTarget {
    table: String,
    key: String,
    fetch: FetchMode,
}

impl ForeignTarget {
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn fetch(&self) -> FetchMode {
        self.fetch
    }
}

/// An immutable descriptor of one table column.
///
/// Built once per table through [`ColumnDefinitionBuilder`] and cached on
/// the table mapping for the process lifetime of the repository.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    table: String,
    name: String,
    field: Option<String>,
    ty: ColumnType,
    charset: Option<String>,
    length: Option<u32>,
    flags: u32,
    decimals: Option<u8>,
    nullable: bool,
    auto_increment: bool,
    primary: bool,
    unique: bool,
    composite: bool,
    unsigned: bool,
    zero_filled: bool,
    foreign: Option<ForeignTarget>,
}

impl ColumnDefinition {
    /// Starts building a column definition for `table`.`name`.
    pub fn builder(
        table: impl Into<String>,
        name: impl Into<String>,
        ty: ColumnType,
    ) -> ColumnDefinitionBuilder {
        ColumnDefinitionBuilder {
            column: ColumnDefinition {
                table: table.into(),
                name: name.into(),
                field: None,
                ty,
                charset: None,
                length: None,
                flags: 0,
                decimals: None,
                nullable: true,
                auto_increment: false,
                primary: false,
                unique: false,
                composite: false,
                unsigned: false,
                zero_filled: false,
                foreign: None,
            },
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The record field this column maps onto: the explicit override when
    /// one was given, otherwise the snake_case form of the column name.
    pub fn field_name(&self) -> String {
        match &self.field {
            Some(field) => field.clone(),
            None => self.name.to_snake_case(),
        }
    }

    pub fn ty(&self) -> ColumnType {
        self.ty
    }

    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    pub fn length(&self) -> Option<u32> {
        self.length
    }

    pub fn flags(&self) -> u32 {
        self.flags
    }

    pub fn decimals(&self) -> Option<u8> {
        self.decimals
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_auto_increment(&self) -> bool {
        self.auto_increment
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// True when the column is part of a multi-column key.
    pub fn is_composite(&self) -> bool {
        self.composite
    }

    pub fn is_unsigned(&self) -> bool {
        self.unsigned
    }

    pub fn is_zero_filled(&self) -> bool {
        self.zero_filled
    }

    pub fn foreign(&self) -> Option<&ForeignTarget> {
        self.foreign.as_ref()
    }
}

/// Fluent builder for [`ColumnDefinition`].
#[derive(Debug)]
pub struct ColumnDefinitionBuilder {
    column: ColumnDefinition,
}

impl ColumnDefinitionBuilder {
    /// Overrides the record field name derived from the column name.
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.column.field = Some(field.into());
        self
    }

    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.column.charset = Some(charset.into());
        self
    }

    pub fn length(mut self, length: u32) -> Self {
        self.column.length = Some(length);
        self
    }

    /// Raw driver flags, carried through untouched.
    pub fn flags(mut self, flags: u32) -> Self {
        self.column.flags = flags;
        self
    }

    pub fn decimals(mut self, decimals: u8) -> Self {
        self.column.decimals = Some(decimals);
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.column.nullable = nullable;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.column.auto_increment = true;
        self
    }

    pub fn primary(mut self) -> Self {
        self.column.primary = true;
        self.column.nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.column.unique = true;
        self
    }

    pub fn composite(mut self) -> Self {
        self.column.composite = true;
        self
    }

    pub fn unsigned(mut self) -> Self {
        self.column.unsigned = true;
        self
    }

    pub fn zero_filled(mut self) -> Self {
        self.column.zero_filled = true;
        self
    }

    /// Marks the column as a foreign key into `table`.`key`.
    pub fn references(
        mut self,
        table: impl Into<String>,
        key: impl Into<String>,
        fetch: FetchMode,
    ) -> Self {
        self.column.foreign = Some(ForeignTarget {
            table: table.into(),
            key: key.into(),
            fetch,
        });
        self
    }

    pub fn build(self) -> ColumnDefinition {
        self.column
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_name_defaults_to_snake_case() {
        let column = ColumnDefinition::builder("books", "authorId", ColumnType::BigInt).build();
        assert_eq!(column.field_name(), "author_id");

        let column = ColumnDefinition::builder("books", "title", ColumnType::VarChar).build();
        assert_eq!(column.field_name(), "title");
    }

    #[test]
    fn field_name_override_wins() {
        let column = ColumnDefinition::builder("books", "isbn_13", ColumnType::VarChar)
            .field("isbn")
            .build();
        assert_eq!(column.field_name(), "isbn");
    }

    #[test]
    fn primary_implies_not_null() {
        let column = ColumnDefinition::builder("books", "id", ColumnType::BigInt)
            .primary()
            .auto_increment()
            .build();
        assert!(column.is_primary());
        assert!(!column.is_nullable());
        assert!(column.is_auto_increment());
    }

    #[test]
    fn references_carries_fetch_mode() {
        let column = ColumnDefinition::builder("books", "author_id", ColumnType::BigInt)
            .references("authors", "id", FetchMode::Always)
            .build();
        let foreign = column.foreign().unwrap();
        assert_eq!(foreign.table(), "authors");
        assert_eq!(foreign.key(), "id");
        assert_eq!(foreign.fetch(), FetchMode::Always);
    }
}

/// Declares a mapped record type: the struct, its [`Schema`](crate::Schema)
/// implementation, and the field accessor table, from one declaration.
///
/// Scalar fields become [`Field<T>`](crate::Field); fields marked `foreign`
/// become [`ForeignField<T>`](crate::ForeignField). Each field carries the
/// column definition builder for its backing column; the macro finishes the
/// builders.
///
/// ```ignore
/// schema! {
///     table = "books",
///     #[derive(Debug, Clone, PartialEq)]
///     pub struct Book {
///         id: i64 = ColumnDefinition::builder("books", "id", ColumnType::BigInt)
///             .primary()
///             .auto_increment(),
///         title: String = ColumnDefinition::builder("books", "title", ColumnType::VarChar)
///             .length(255),
///         author_id: foreign Author = ColumnDefinition::builder("books", "author_id", ColumnType::BigInt)
///             .references("authors", "id", FetchMode::Lazy),
///     }
/// }
/// ```
#[macro_export]
macro_rules! schema {
    (
        table = $table:literal,
        $(#[$meta:meta])*
        $vis:vis struct $name:ident { $($body:tt)* }
    ) => {
        $crate::schema! {
            @parse
            table = $table,
            meta = [$(#[$meta])*],
            vis = [$vis],
            name = $name,
            fields = [],
            rest = [$($body)*]
        }
    };

    // Foreign-key field: `author_id: foreign Author = <builder>`
    (
        @parse
        table = $table:literal,
        meta = [$($meta:tt)*],
        vis = [$vis:vis],
        name = $name:ident,
        fields = [$($fields:tt)*],
        rest = [$field:ident : foreign $fty:ty = $def:expr $(, $($rest:tt)*)?]
    ) => {
        $crate::schema! {
            @parse
            table = $table,
            meta = [$($meta)*],
            vis = [$vis],
            name = $name,
            fields = [$($fields)* { foreign $field : $fty = $def }],
            rest = [$($($rest)*)?]
        }
    };

    // Scalar field: `title: String = <builder>`
    (
        @parse
        table = $table:literal,
        meta = [$($meta:tt)*],
        vis = [$vis:vis],
        name = $name:ident,
        fields = [$($fields:tt)*],
        rest = [$field:ident : $fty:ty = $def:expr $(, $($rest:tt)*)?]
    ) => {
        $crate::schema! {
            @parse
            table = $table,
            meta = [$($meta)*],
            vis = [$vis],
            name = $name,
            fields = [$($fields)* { scalar $field : $fty = $def }],
            rest = [$($($rest)*)?]
        }
    };

    // All fields consumed: emit the struct and its Schema implementation.
    (
        @parse
        table = $table:literal,
        meta = [$($meta:tt)*],
        vis = [$vis:vis],
        name = $name:ident,
        fields = [$({ $kind:ident $field:ident : $fty:ty = $def:expr })*],
        rest = []
    ) => {
        $($meta)*
        $vis struct $name {
            $( pub $field: $crate::schema!(@field_type $kind $fty) ),*
        }

        impl $crate::Schema for $name {
            const TABLE: &'static str = $table;

            fn definition() -> ::std::vec::Vec<$crate::ColumnDefinition> {
                ::std::vec![ $( ($def).build() ),* ]
            }

            fn fields() -> ::std::vec::Vec<$crate::FieldDescriptor<Self>> {
                ::std::vec![ $( $crate::schema!(@descriptor $name, $kind, $field, $fty) ),* ]
            }

            fn empty() -> Self {
                Self {
                    $( $field: ::core::default::Default::default() ),*
                }
            }
        }
    };

    (@field_type scalar $fty:ty) => { $crate::Field<$fty> };
    (@field_type foreign $fty:ty) => { $crate::ForeignField<$fty> };

    (@descriptor $name:ident, scalar, $field:ident, $fty:ty) => {
        $crate::FieldDescriptor::scalar(
            stringify!($field),
            |record: &$name| record.$field.to_value(),
            |record: &mut $name, value| record.$field.assign(value),
        )
    };
    (@descriptor $name:ident, foreign, $field:ident, $fty:ty) => {
        $crate::FieldDescriptor::foreign(
            stringify!($field),
            |record: &$name| record.$field.to_value(),
            |record: &mut $name, value| {
                record.$field.assign(value);
                ::core::result::Result::Ok(())
            },
            |record: &mut $name, key, nested| {
                record.$field.load(key, nested.downcast::<$fty>()?);
                ::core::result::Result::Ok(())
            },
            |record: &$name| record.$field.is_loaded(),
        )
    };
}

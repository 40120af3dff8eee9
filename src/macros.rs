/// Builds a [`Document`](crate::document::Document) from `name => value`
/// pairs. Strings become untokenized stored terms, integers and floats go
/// through the numeric token stream at indexing time.
///
/// ```
/// use fulltext_index::doc;
///
/// let doc = doc!(
///     "name" => "A",
///     "seq" => 0i64,
/// );
/// assert_eq!(2, doc.len());
/// ```
#[macro_export]
macro_rules! doc(
    () => {
        $crate::document::Document::default()
    };
    ($($field:expr => $value:expr),*) => {
        {
            let mut doc = $crate::document::Document::default();
            $(
                $crate::document::DocValue::from($value).add_to(&mut doc, $field);
            )*
            doc
        }
    };
    // if there is a trailing comma retry with the trailing comma stripped.
    ($($field:expr => $value:expr),+ ,) => {
        doc!( $( $field => $value ), *)
    };
);

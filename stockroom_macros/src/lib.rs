mod document;

use proc_macro::TokenStream;

/// Derive macro implementing `stockroom::Document` for a struct.
///
/// # Usage
///
/// ```ignore
/// #[derive(Clone, Serialize, Deserialize, Document)]
/// #[document(collection = "equipment")]
/// struct Part {
///     #[document(id)]
///     code: String,
///     name: String,
/// }
/// ```
///
/// Without `collection`, the collection name is the snake_case struct name
/// plus `s`. Without `#[document(id)]`, a field named `id` is used.
#[proc_macro_derive(Document, attributes(document))]
pub fn derive_document(input: TokenStream) -> TokenStream {
    document::derive_document(input)
}

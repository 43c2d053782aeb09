use proc_macro::TokenStream;
use quote::quote;
use syn::meta::ParseNestedMeta;
use syn::{Attribute, Data, DeriveInput, Field, Fields, LitStr, Token};

pub fn derive_document(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;

    // Extract #[document(collection = "...")] from struct-level attributes
    let collection = extract_collection(input)?;

    // The field marked with #[document(id)], or a field named "id"
    let id_field = extract_id_field(input)?;
    let id_ident = id_field
        .ident
        .as_ref()
        .ok_or_else(|| syn::Error::new_spanned(id_field, "Document id field must be named"))?;

    // ID_FIELD is the key serde writes, so it must follow serde's renames
    let id_key = serialized_name(input, id_field)?;

    Ok(quote! {
        impl stockroom::Document for #name {
            const COLLECTION: &'static str = #collection;
            const ID_FIELD: &'static str = #id_key;

            fn id(&self) -> &str {
                &self.#id_ident
            }
        }
    })
}

fn extract_collection(input: &DeriveInput) -> syn::Result<String> {
    let mut collection = None;

    for attr in input.attrs.iter().filter(|a| a.path().is_ident("document")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("collection") {
                let value: LitStr = meta.value()?.parse()?;
                collection = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unsupported document attribute, expected `collection = \"...\"`"))
            }
        })?;
    }

    // Default: snake_case struct name + "s"
    Ok(collection.unwrap_or_else(|| format!("{}s", to_snake_case(&input.ident.to_string()))))
}

fn extract_id_field(input: &DeriveInput) -> syn::Result<&Field> {
    let Data::Struct(data_struct) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Document can only be derived for structs",
        ));
    };
    let Fields::Named(fields) = &data_struct.fields else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Document requires a struct with named fields",
        ));
    };

    let mut marked = None;
    for field in &fields.named {
        for attr in field.attrs.iter().filter(|a| a.path().is_ident("document")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("id") {
                    if marked.is_some() {
                        return Err(meta.error("only one field may be marked #[document(id)]"));
                    }
                    marked = Some(field);
                    Ok(())
                } else {
                    Err(meta.error("unsupported document attribute, expected `id`"))
                }
            })?;
        }
    }
    if let Some(field) = marked {
        return Ok(field);
    }

    fields
        .named
        .iter()
        .find(|field| field.ident.as_ref().is_some_and(|ident| ident == "id"))
        .ok_or_else(|| {
            syn::Error::new_spanned(
                &input.ident,
                "Document derive: no field marked with #[document(id)] and no field named `id`",
            )
        })
}

/// Name serde gives `field` in the serialized body.
fn serialized_name(input: &DeriveInput, field: &Field) -> syn::Result<String> {
    if let Some(rename) = serde_name(&field.attrs, "rename")? {
        return Ok(rename);
    }

    let ident = field
        .ident
        .as_ref()
        .map(|ident| ident.to_string())
        .unwrap_or_default();
    let ident = ident.trim_start_matches("r#");

    match serde_name(&input.attrs, "rename_all")? {
        Some(rule) => apply_rename_rule(&rule, ident)
            .ok_or_else(|| syn::Error::new_spanned(&input.ident, format!("unknown rename_all rule `{rule}`"))),
        None => Ok(ident.to_string()),
    }
}

/// Value of `#[serde(key = "..")]` or `#[serde(key(serialize = "..", deserialize = ".."))]`.
///
/// The store key is both written and read back, so the two directions must agree.
fn serde_name(attrs: &[Attribute], key: &str) -> syn::Result<Option<String>> {
    let mut found = None;

    for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
        attr.parse_nested_meta(|meta| {
            if !meta.path.is_ident(key) {
                return skip_value(&meta);
            }
            if meta.input.peek(Token![=]) {
                let value: LitStr = meta.value()?.parse()?;
                found = Some(value.value());
                return Ok(());
            }

            let mut serialize = None;
            let mut deserialize = None;
            meta.parse_nested_meta(|side| {
                let value: LitStr = side.value()?.parse()?;
                if side.path.is_ident("serialize") {
                    serialize = Some(value.value());
                } else if side.path.is_ident("deserialize") {
                    deserialize = Some(value.value());
                }
                Ok(())
            })?;
            if serialize != deserialize {
                return Err(meta.error(format!(
                    "Document key needs one `{key}` for both serialize and deserialize"
                )));
            }
            found = serialize;
            Ok(())
        })?;
    }

    Ok(found)
}

/// Consume the value of a serde option this derive does not care about.
fn skip_value(meta: &ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        meta.value()?.parse::<syn::Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        let content;
        syn::parenthesized!(content in meta.input);
        content.parse::<proc_macro2::TokenStream>()?;
    }
    Ok(())
}

/// serde's `rename_all` rules as they apply to snake_case field names.
fn apply_rename_rule(rule: &str, field: &str) -> Option<String> {
    let renamed = match rule {
        "lowercase" | "snake_case" => field.to_string(),
        "UPPERCASE" | "SCREAMING_SNAKE_CASE" => field.to_ascii_uppercase(),
        "kebab-case" => field.replace('_', "-"),
        "SCREAMING-KEBAB-CASE" => field.to_ascii_uppercase().replace('_', "-"),
        "PascalCase" => to_pascal_case(field),
        "camelCase" => {
            let pascal = to_pascal_case(field);
            let mut chars = pascal.chars();
            match chars.next() {
                Some(first) => first.to_lowercase().chain(chars).collect(),
                None => String::new(),
            }
        }
        _ => return None,
    };
    Some(renamed)
}

fn to_pascal_case(s: &str) -> String {
    let mut result = String::new();
    let mut capitalize = true;
    for ch in s.chars() {
        if ch == '_' {
            capitalize = true;
        } else if capitalize {
            result.extend(ch.to_uppercase());
            capitalize = false;
        } else {
            result.push(ch);
        }
    }
    result
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, ch) in s.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.extend(ch.to_lowercase());
        } else {
            result.push(ch);
        }
    }
    result
}
